pub mod config;
pub mod retry_policy;
pub mod services;
pub mod value_objects;

pub use config::{SearchMode, SearchSettings, SiteCatalog, SiteConfig, SiteConfigBuilder, SiteHints};
pub use retry_policy::RetryPolicy;
