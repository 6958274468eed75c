//! Bounded exponential backoff for optimistic-concurrency conflicts.

use std::future::Future;
use std::time::Duration;

use fintrack_shared::{AppError, AppResult};
use fintrack_shared::config::RetryConfig;

/// Retry policy for operations that lose a commit race.
///
/// Only [`AppError::Conflict`] is retried. Every other outcome, including
/// timeouts, is returned to the caller as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// Total attempts, including the first one.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Backoff ceiling after the `attempt`-th failure (1-based).
    ///
    /// Doubles from the base delay and saturates at the max delay.
    #[must_use]
    pub fn ceiling(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Randomised delay in `[ceiling / 2, ceiling]` after the `attempt`-th failure.
    fn delay(&self, attempt: u32) -> Duration {
        let ceiling = u64::try_from(self.ceiling(attempt).as_millis()).unwrap_or(u64::MAX);
        let floor = ceiling / 2;
        Duration::from_millis(rand::random_range(floor..=ceiling))
    }

    /// Runs `attempt` until it succeeds, fails with a non-conflict error, or
    /// the attempts are used up.
    ///
    /// Each call of `attempt` must re-read whatever state it depends on.
    pub async fn run<T, F, Fut>(&self, operation: &'static str, mut attempt: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut tries = 1;
        loop {
            match attempt().await {
                Err(AppError::Conflict(reason)) if tries < self.max_attempts => {
                    let delay = self.delay(tries);
                    tracing::warn!(
                        operation,
                        attempt = tries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        %reason,
                        "Commit conflict, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    tries += 1;
                }
                Err(AppError::Conflict(reason)) => {
                    tracing::warn!(operation, attempts = tries, %reason, "Retries exhausted");
                    return Err(AppError::Conflict(reason));
                }
                other => return other,
            }
        }
    }
}
