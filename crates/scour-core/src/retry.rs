//! Bounded retry with exponential backoff.
//!
//! ```text
//! attempt 0 --fail--> sleep base*1 --> attempt 1 --fail--> sleep base*2 --> ... attempt n --fail--> Err
//! ```
//!
//! An operation is run at most `max_retries + 1` times. Non-retryable errors
//! (see [`AppError::is_retryable`]) are returned after the first attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::AppError;

/// Retry budget and backoff schedule.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    /// `backoff_base * 2^attempt` (attempt is 0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Run `operation` until it succeeds or the budget is spent.
    ///
    /// The last error is returned unmodified.
    pub async fn execute<T, F, Fut>(&self, mut operation: F) -> Result<T, AppError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let mut attempt = 0u32;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() => {
                    tracing::error!(attempt, error = %e, "Non-retryable failure");
                    return Err(e);
                }
                Err(e) if attempt >= self.max_retries => {
                    tracing::error!(attempt, error = %e, "Final attempt failed");
                    return Err(e);
                }
                Err(e) => {
                    let wait = self.delay_for_attempt(attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        wait_ms = %wait.as_millis(),
                        error = %e,
                        "Attempt failed, retrying"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
            }
        }
    }
}
