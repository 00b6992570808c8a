use std::sync::atomic::{AtomicU64, Ordering};

use crate::modules::search::domain::value_objects::{SearchOutcome, SearchStatus};

/// Session counters for every search run through one orchestrator
///
/// Counters are atomics so concurrent site searches can share one instance.
#[derive(Debug, Default)]
pub struct SearchMetrics {
    total_searches: AtomicU64,
    accepted: AtomicU64,
    low_confidence: AtomicU64,
    no_results: AtomicU64,
    errors: AtomicU64,
    cancelled: AtomicU64,
    attempts: AtomicU64,
    transient_failures: AtomicU64,
}

/// Point-in-time copy of `SearchMetrics`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct MetricsSnapshot {
    pub total_searches: u64,
    pub accepted: u64,
    pub low_confidence: u64,
    pub no_results: u64,
    pub errors: u64,
    pub cancelled: u64,
    pub attempts: u64,
    pub transient_failures: u64,
}

impl SearchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_outcome(&self, outcome: &SearchOutcome) {
        self.total_searches.fetch_add(1, Ordering::Relaxed);
        self.attempts
            .fetch_add(u64::from(outcome.attempts), Ordering::Relaxed);

        let counter = match outcome.status {
            SearchStatus::Accepted => &self.accepted,
            SearchStatus::LowConfidence => &self.low_confidence,
            SearchStatus::NoResults => &self.no_results,
            SearchStatus::Error => &self.errors,
            SearchStatus::Cancelled => &self.cancelled,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transient_failure(&self) {
        self.transient_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_searches: self.total_searches.load(Ordering::Relaxed),
            accepted: self.accepted.load(Ordering::Relaxed),
            low_confidence: self.low_confidence.load(Ordering::Relaxed),
            no_results: self.no_results.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            attempts: self.attempts.load(Ordering::Relaxed),
            transient_failures: self.transient_failures.load(Ordering::Relaxed),
        }
    }

    /// Share of searches that ended accepted, as a percentage
    pub fn success_rate(&self) -> f64 {
        let snapshot = self.snapshot();
        if snapshot.total_searches == 0 {
            return 0.0;
        }
        (snapshot.accepted as f64 / snapshot.total_searches as f64) * 100.0
    }

    /// Generate a human-readable report
    pub fn report(&self) -> String {
        let s = self.snapshot();
        [
            "=== Search Metrics ===".to_string(),
            format!("Total Searches: {}", s.total_searches),
            format!("Accepted: {} ({:.1}%)", s.accepted, self.success_rate()),
            format!("Low Confidence: {}", s.low_confidence),
            format!("No Results: {}", s.no_results),
            format!("Errors: {}", s.errors),
            format!("Cancelled: {}", s.cancelled),
            format!("Search Attempts: {}", s.attempts),
            format!("Transient Failures: {}", s.transient_failures),
        ]
        .join("\n")
    }
}
