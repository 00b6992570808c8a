pub mod page_query;

#[cfg(test)]
pub use page_query::MockPageQuery;
pub use page_query::{ElementHandle, IdleState, Interaction, PageError, PageFactory, PageQuery};
