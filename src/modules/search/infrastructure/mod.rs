pub mod politeness;
pub mod retry_util;
pub mod url_normalizer;

pub use politeness::SitePoliteness;
pub use retry_util::{RetryOutcome, RetryUtil};
pub use url_normalizer::{is_on_domain, normalize_candidate_url};
