//! Retry and pacing policy for storefront searches
//!
//! Storefront search boxes are slow and flaky rather than rate-limited by
//! headers, so delays are drawn from a range with jitter instead of backing off
//! exponentially.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::shared::errors::{AppError, AppResult};

/// Configuration for retrying one search variant and bounding a whole book search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Submission tries per query variant, counting the first one
    pub max_attempts_per_variant: u32,
    /// Lower bound of the pause between tries
    pub min_delay_ms: u64,
    /// Upper bound of the pause between tries
    pub max_delay_ms: u64,
    /// Extra random share of the drawn delay, 0.0 disables it
    pub jitter_ratio: f64,
    /// Query variants tried before giving up
    pub max_variants: usize,
    /// Limit for each single page collaborator call
    pub attempt_timeout_ms: u64,
    /// Wall-clock budget for one book on one site
    pub book_budget_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::conservative()
    }
}

impl RetryPolicy {
    /// Production pacing: three tries, two to four seconds apart
    pub fn conservative() -> Self {
        Self {
            max_attempts_per_variant: 3,
            min_delay_ms: 2_000,
            max_delay_ms: 4_000,
            jitter_ratio: 0.1,
            max_variants: 8,
            attempt_timeout_ms: 30_000,
            book_budget_ms: 180_000,
        }
    }

    /// No pauses and short limits, for fakes that answer instantly
    pub fn immediate() -> Self {
        Self {
            max_attempts_per_variant: 3,
            min_delay_ms: 0,
            max_delay_ms: 0,
            jitter_ratio: 0.0,
            max_variants: 8,
            attempt_timeout_ms: 1_000,
            book_budget_ms: 10_000,
        }
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }

    pub fn book_budget(&self) -> Duration {
        Duration::from_millis(self.book_budget_ms)
    }

    /// Draw the pause before the next try
    pub fn calculate_delay(&self) -> Duration {
        let mut rng = rand::thread_rng();

        let base_ms = if self.max_delay_ms > self.min_delay_ms {
            rng.gen_range(self.min_delay_ms..=self.max_delay_ms)
        } else {
            self.min_delay_ms
        };

        let jitter_ms = if self.jitter_ratio > 0.0 {
            (base_ms as f64 * self.jitter_ratio * rng.gen::<f64>()) as u64
        } else {
            0
        };

        Duration::from_millis(base_ms + jitter_ms)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.max_attempts_per_variant == 0 {
            return Err(AppError::ValidationError(
                "max_attempts_per_variant must be > 0".to_string(),
            ));
        }

        if self.min_delay_ms > self.max_delay_ms {
            return Err(AppError::ValidationError(format!(
                "min_delay_ms ({}) cannot exceed max_delay_ms ({})",
                self.min_delay_ms, self.max_delay_ms
            )));
        }

        if !(0.0..=1.0).contains(&self.jitter_ratio) {
            return Err(AppError::ValidationError(format!(
                "jitter_ratio must be between 0.0 and 1.0, got {}",
                self.jitter_ratio
            )));
        }

        if self.max_variants == 0 {
            return Err(AppError::ValidationError(
                "max_variants must be > 0".to_string(),
            ));
        }

        if self.attempt_timeout_ms == 0 || self.book_budget_ms == 0 {
            return Err(AppError::ValidationError(
                "attempt_timeout_ms and book_budget_ms must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}
