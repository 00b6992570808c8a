//! Per-site request pacing shared by concurrent book searches
//!
//! One keyed limiter holds a bucket per site id, so ten books searched in
//! parallel against the same storefront still submit at the site's pace.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Jitter, Quota, RateLimiter};

use crate::modules::search::domain::config::SearchSettings;

type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

pub struct SitePoliteness {
    limiter: KeyedLimiter,
    jitter: Duration,
}

impl SitePoliteness {
    /// Create a limiter allowing `requests_per_minute` per site with `burst` capacity
    pub fn new(requests_per_minute: u32, burst: u32, jitter: Duration) -> Self {
        let rate = NonZeroU32::new(requests_per_minute.max(1)).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(burst.max(1)).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_minute(rate).allow_burst(burst);

        Self {
            limiter: RateLimiter::keyed(quota),
            jitter,
        }
    }

    pub fn from_settings(settings: &SearchSettings) -> Self {
        Self::new(
            settings.site_requests_per_minute,
            settings.site_burst,
            Duration::from_millis(settings.politeness_jitter_ms),
        )
    }

    /// Wait until `site_id` may receive another search submission
    pub async fn until_ready(&self, site_id: &str) {
        let key = site_id.to_string();
        if self.limiter.check_key(&key).is_ok() {
            return;
        }

        log::debug!("POLITENESS: waiting for {} quota", site_id);
        self.limiter
            .until_key_ready_with_jitter(&key, Jitter::up_to(self.jitter))
            .await;
    }

    /// Non-blocking check, consumes a slot when one is free
    pub fn try_acquire(&self, site_id: &str) -> bool {
        self.limiter.check_key(&site_id.to_string()).is_ok()
    }
}
