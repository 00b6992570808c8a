pub mod query_variant_generator;
pub mod search_metrics;

pub use query_variant_generator::QueryVariantGenerator;
pub use search_metrics::{MetricsSnapshot, SearchMetrics};
