pub mod batch_report;
pub mod candidate;
pub mod query_variant;
pub mod search_outcome;

pub use batch_report::BatchReport;
pub use candidate::{CandidateResult, ScoredCandidate};
pub use query_variant::{QueryVariant, VariantStrategy};
pub use search_outcome::{SearchFailure, SearchOutcome, SearchStatus};
