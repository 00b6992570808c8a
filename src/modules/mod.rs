pub mod search;
pub mod title;
