pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-exports for easy external access
pub use application::{
    ElementHandle, IdleState, Interaction, PageError, PageFactory, PageQuery, SearchOrchestrator,
    SiteSearchPool, SiteSession, StorefrontSearch,
};
pub use domain::services::{MetricsSnapshot, QueryVariantGenerator, SearchMetrics};
pub use domain::value_objects::{
    BatchReport, CandidateResult, QueryVariant, ScoredCandidate, SearchFailure, SearchOutcome,
    SearchStatus, VariantStrategy,
};
pub use domain::{RetryPolicy, SearchMode, SearchSettings, SiteCatalog, SiteConfig, SiteHints};
