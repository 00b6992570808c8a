pub mod orchestrator;
pub mod ports;
pub mod selector_fallback;
pub mod site_search_pool;
pub mod site_session;

// Re-export commonly used types
pub use orchestrator::SearchOrchestrator;
pub use ports::{ElementHandle, IdleState, Interaction, PageError, PageFactory, PageQuery};
pub use selector_fallback::{find_first_match, SelectorFallbackMatcher, SelectorMatch};
pub use site_search_pool::SiteSearchPool;
pub use site_session::{SiteSession, StorefrontSearch};
