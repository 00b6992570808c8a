//! Finds the product page of a book on configured storefront sites, starting
//! from a noisy (often Japanese) title.
//!
//! The browser is not part of this crate: callers supply a [`PageFactory`]
//! that opens pages implementing [`PageQuery`].

pub mod modules;
pub mod shared;

pub use modules::search::{
    BatchReport, PageError, PageFactory, PageQuery, RetryPolicy, SearchOrchestrator,
    SearchOutcome, SearchSettings, SearchStatus, SiteCatalog, SiteConfig, SiteSearchPool,
    SiteSession, StorefrontSearch,
};
pub use modules::title::{is_title_match, normalize, score, MatchScore, MatchTier};
pub use shared::utils::logger::init_logger;
pub use shared::{AppError, AppResult};
