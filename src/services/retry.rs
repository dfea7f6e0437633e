// src/services/retry.rs

//! Retry policy for the fetch phase.
//!
//! Implements bounded attempts with exponential backoff:
//! after failed attempt `n` (1-based) the poller waits `factor^n` seconds,
//! unless `n` was the last attempt.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::RetryConfig;

/// Retry policy implementing exponential backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Base of the exponential backoff, in seconds.
    pub backoff_factor: u64,
}

impl RetryPolicy {
    /// Create a new RetryPolicy from configuration settings.
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            backoff_factor: config.backoff_factor,
        }
    }

    /// Delay to wait after failed attempt `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_secs(self.backoff_factor.saturating_pow(attempt))
    }

    /// Whether a fetch that failed on `attempt` should be tried again.
    pub fn should_retry(&self, error: &AppError, attempt: u32) -> bool {
        error.is_transient() && attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(&RetryConfig::default())
    }
}

/// Waits between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.backoff_factor, 2);
    }

    #[test]
    fn test_backoff_calculation() {
        let policy = RetryPolicy::default();

        // attempt 1: 2^1 = 2
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        // attempt 2: 2^2 = 4
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
    }

    #[test]
    fn test_backoff_saturates() {
        let policy = RetryPolicy {
            max_attempts: 100,
            backoff_factor: 10,
        };
        assert_eq!(policy.backoff(40), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_should_retry_transient_until_last_attempt() {
        let policy = RetryPolicy::default();
        let err = AppError::Status { status: 503 };

        assert!(policy.should_retry(&err, 1));
        assert!(policy.should_retry(&err, 2));
        assert!(!policy.should_retry(&err, 3));
    }

    #[test]
    fn test_should_retry_never_for_unexpected() {
        let policy = RetryPolicy::default();
        let err = AppError::malformed("not an object");
        assert!(!policy.should_retry(&err, 1));
    }
}
