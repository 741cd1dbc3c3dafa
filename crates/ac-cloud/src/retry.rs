//! Retry with exponential backoff and jitter

use crate::error::{CloudError, CloudResult};
use exponential_backoff::Backoff;
use std::future::Future;
use std::time::Duration;

/// First retry delay.
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_millis(200);

/// Upper bound on a single retry delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(20);

const JITTER: f32 = 0.3;

/// Retries a cloud call on retryable errors, with a fixed budget.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff: Backoff,
}

impl RetryPolicy {
    /// Policy with the default delays and `max_retries` retries after the first attempt.
    pub fn new(max_retries: u32) -> Self {
        Self::with_delays(max_retries, DEFAULT_MIN_DELAY, DEFAULT_MAX_DELAY)
    }

    /// Policy with custom delay bounds.
    pub fn with_delays(max_retries: u32, min: Duration, max: Duration) -> Self {
        // Retries are counted by `run`; the backoff sequence itself is unbounded.
        let mut backoff = Backoff::new(u32::MAX, min, Some(max));
        backoff.set_jitter(JITTER);
        Self {
            max_retries,
            backoff,
        }
    }

    /// Policy that never retries.
    pub fn none() -> Self {
        Self::new(0)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before retry number `retry` (0-based).
    pub fn delay(&self, retry: u32) -> Duration {
        self.backoff.next(retry).unwrap_or(DEFAULT_MAX_DELAY)
    }

    /// Run `call` until it succeeds, fails with a non-retryable error, or
    /// the budget is spent.
    ///
    /// A spent budget is reported as [`CloudError::RetriesExhausted`]
    /// wrapping the last error.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> CloudResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = CloudResult<T>>,
    {
        let mut retry = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && retry < self.max_retries => {
                    let delay = self.delay(retry);
                    log::debug!(
                        "{} failed ({}); retry {}/{} in {:?}",
                        operation,
                        err,
                        retry + 1,
                        self.max_retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(err) if err.is_retryable() => {
                    return Err(CloudError::RetriesExhausted {
                        operation: operation.to_string(),
                        attempts: retry + 1,
                        last: Box::new(err),
                    });
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5)
    }
}

#[cfg(test)]
#[path = "retry_test.rs"]
mod tests;
