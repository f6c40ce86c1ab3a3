//! Retry with exponential backoff for provider calls.
//!
//! Only transient failures are retried (see `ProviderError::is_retryable`);
//! a rejected request or malformed payload fails on the first attempt.

use crate::error::ProviderError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// How many times to call the provider and how long to wait in between.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts including the first; values below 1 behave as 1
    pub max_attempts: u32,
    /// Wait before the first retry
    pub initial_delay: Duration,
    /// Upper bound on any single wait
    pub max_delay: Duration,
    /// Growth factor applied to the wait after each retry
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }

    /// Three attempts waiting 1s then 2s, capped at 5s per wait.
    pub fn api_call() -> Self {
        Self {
            max_delay: Duration::from_secs(5),
            ..Self::new(3, Duration::from_secs(1))
        }
    }

    /// A single attempt.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Wait before retry number `retry` (1 = first retry).
    fn backoff(&self, retry: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(retry.saturating_sub(1) as i32);
        Duration::try_from_secs_f64(self.initial_delay.as_secs_f64() * factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::api_call()
    }
}

/// Run a provider call, retrying transient failures with backoff.
///
/// Returns the first success, the first non-retryable error, or the last
/// error once every attempt is used up.
pub async fn retry_provider_call<T, F, Fut>(
    config: &RetryConfig,
    what: &str,
    mut call: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let err = match call().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}/{}", what, attempt, attempts);
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !err.is_retryable() {
            debug!("{} failed permanently: {}", what, err);
            return Err(err);
        }
        if attempt >= attempts {
            warn!("{} failed after {} attempt(s): {}", what, attempts, err);
            return Err(err);
        }

        let wait = config.backoff(attempt);
        warn!(
            "{} failed on attempt {}/{} ({}), retrying in {:?}",
            what, attempt, attempts, err, wait
        );
        sleep(wait).await;
        attempt += 1;
    }
}
