use log::{debug, error, info};
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize the logging system.
/// Safe to call more than once; only the first call installs the logger.
pub fn init_logger() {
    INIT.call_once(|| {
        let _ = env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .filter_module("title_locator", log::LevelFilter::Debug)
            .filter_module("governor", log::LevelFilter::Warn)
            .filter_module("tokio", log::LevelFilter::Warn)
            .format_timestamp_secs()
            .format_target(false)
            .format_module_path(false)
            .try_init();

        info!("Logging system initialized");
    });
}

/// Macro for structured logging with context
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        log::info!($($arg)*)
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        log::debug!($($arg)*)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        log::warn!($($arg)*)
    };
}

/// Structured logging helpers for the search pipeline
pub struct LogContext;

impl LogContext {
    /// Log a single storefront search, before and after results are known
    pub fn search_operation(query: &str, site: Option<&str>, results: Option<usize>) {
        match (site, results) {
            (Some(s), Some(r)) => info!("Search: '{}' on {} returned {} candidates", query, s, r),
            (Some(s), None) => debug!("Search: Starting '{}' on {}", query, s),
            (None, Some(r)) => info!("Search: '{}' returned {} candidates", query, r),
            (None, None) => debug!("Search: Starting '{}'", query),
        }
    }

    /// Log a candidate that was scored against the book title
    pub fn candidate_scored(site: &str, candidate: &str, score: f64, tier: &str) {
        debug!(
            "Score: [{}] '{}' scored {:.3} ({})",
            site, candidate, score, tier
        );
    }

    /// Log batch progress
    pub fn batch_progress(current: usize, total: usize, title: &str) {
        info!("Batch: [{}/{}] Locating '{}'", current, total, title);
    }

    /// Log errors with context
    pub fn error_with_context(error: &dyn std::error::Error, context: &str) {
        error!("{}: {}", context, error);
    }

    /// Log performance metrics
    pub fn performance_metric(operation: &str, duration_ms: u64, additional_info: Option<&str>) {
        match additional_info {
            Some(extra) => info!(
                "Performance: {} took {}ms ({})",
                operation, duration_ms, extra
            ),
            None => info!("Performance: {} took {}ms", operation, duration_ms),
        }
    }
}

/// Helper for timing operations
pub struct TimedOperation {
    start: std::time::Instant,
    operation: String,
}

impl TimedOperation {
    pub fn new(operation: &str) -> Self {
        debug!("Starting: {}", operation);
        Self {
            start: std::time::Instant::now(),
            operation: operation.to_string(),
        }
    }

    pub fn finish(self) -> u64 {
        let duration = self.start.elapsed().as_millis() as u64;
        LogContext::performance_metric(&self.operation, duration, None);
        duration
    }

    pub fn finish_with_info(self, extra: &str) -> u64 {
        let duration = self.start.elapsed().as_millis() as u64;
        LogContext::performance_metric(&self.operation, duration, Some(extra));
        duration
    }
}
