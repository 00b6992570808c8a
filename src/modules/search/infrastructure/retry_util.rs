use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, timeout, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::modules::search::application::ports::PageError;
use crate::modules::search::domain::retry_policy::RetryPolicy;

/// How a retried operation ended
#[derive(Debug, Clone, PartialEq)]
pub enum RetryOutcome<T> {
    Succeeded(T),
    /// Every try failed transiently, or the deadline passed
    Exhausted(PageError),
    /// A non-transient failure; never retried
    Fatal(PageError),
    Cancelled,
}

/// Retry utility for page collaborator calls
pub struct RetryUtil;

impl RetryUtil {
    /// Run `operation` up to `max_attempts_per_variant` times.
    ///
    /// Only `PageError::Timeout` is retried. Returns the outcome together with
    /// the number of tries actually started. Cancellation is checked before
    /// every try and raced against both the operation and the pause.
    pub async fn with_retry<F, Fut, T>(
        mut operation: F,
        policy: &RetryPolicy,
        cancel: &CancellationToken,
        deadline: Instant,
        operation_name: &str,
    ) -> (RetryOutcome<T>, u32)
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, PageError>>,
    {
        let max_attempts = policy.max_attempts_per_variant.max(1);
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < max_attempts {
            if cancel.is_cancelled() {
                return (RetryOutcome::Cancelled, attempts);
            }
            if Instant::now() >= deadline {
                debug!("{} stopped: search budget spent", operation_name);
                let error = last_error
                    .unwrap_or_else(|| PageError::Timeout("search budget spent".to_string()));
                return (RetryOutcome::Exhausted(error), attempts);
            }

            attempts += 1;
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return (RetryOutcome::Cancelled, attempts),
                result = operation(attempts) => result,
            };

            match result {
                Ok(value) => {
                    if attempts > 1 {
                        debug!(
                            "{} succeeded on attempt {} after {} retries",
                            operation_name,
                            attempts,
                            attempts - 1
                        );
                    }
                    return (RetryOutcome::Succeeded(value), attempts);
                }
                Err(error) if !error.is_transient() => {
                    debug!("{} failed with non-retryable error: {}", operation_name, error);
                    return (RetryOutcome::Fatal(error), attempts);
                }
                Err(error) => {
                    if attempts < max_attempts {
                        let delay = policy
                            .calculate_delay()
                            .min(deadline.saturating_duration_since(Instant::now()));
                        warn!(
                            "{} failed on attempt {} ({}), retrying in {:?}",
                            operation_name, attempts, error, delay
                        );
                        if !Self::sleep_or_cancel(delay, cancel).await {
                            return (RetryOutcome::Cancelled, attempts);
                        }
                    } else {
                        warn!(
                            "{} failed on final attempt {} ({}), giving up",
                            operation_name, attempts, error
                        );
                    }
                    last_error = Some(error);
                }
            }
        }

        let error = last_error.unwrap_or_else(|| PageError::Timeout("no attempts made".to_string()));
        (RetryOutcome::Exhausted(error), attempts)
    }

    /// Sleep unless cancelled first; `false` means cancellation won
    pub async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> bool {
        if delay.is_zero() {
            return !cancel.is_cancelled();
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            _ = sleep(delay) => true,
        }
    }

    /// Bound one collaborator call; an elapsed limit becomes `PageError::Timeout`
    pub async fn bounded<T, Fut>(limit: Duration, call: Fut, what: &str) -> Result<T, PageError>
    where
        Fut: Future<Output = Result<T, PageError>>,
    {
        match timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(PageError::Timeout(format!("{} exceeded {:?}", what, limit))),
        }
    }
}
