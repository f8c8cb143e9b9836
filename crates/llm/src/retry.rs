//! Bounded retry with exponential backoff for collaborator calls.
//!
//! Rate-limit errors back off exponentially; generic upstream failures retry
//! after the initial delay; every other error returns immediately.

use footprint_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Retry bounds for a network-facing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds
    pub initial_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 200,
        }
    }
}

impl RetryPolicy {
    /// A policy that never waits, for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff_ms: 0,
        }
    }

    /// Delay before retrying after `attempt` failed attempts (1-based).
    pub fn backoff_for(&self, error: &AppError, attempt: u32) -> Duration {
        let base = self.initial_backoff_ms;
        let millis = if error.is_rate_limited() {
            base.saturating_mul(1u64 << attempt.saturating_sub(1).min(16))
        } else {
            base
        };
        Duration::from_millis(millis)
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// attempt bound is reached. The last error is returned.
pub async fn retry_async<T, F, Fut>(policy: RetryPolicy, what: &str, mut op: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                let delay = policy.backoff_for(&err, attempt);
                tracing::warn!(
                    "{} failed (attempt {}/{}): {}; retrying in {}ms",
                    what,
                    attempt,
                    max_attempts,
                    err,
                    delay.as_millis()
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_rate_limit_backoff_is_exponential() {
        let policy = RetryPolicy::default();
        let err = AppError::RateLimited("429".to_string());
        assert_eq!(policy.backoff_for(&err, 1), Duration::from_millis(200));
        assert_eq!(policy.backoff_for(&err, 2), Duration::from_millis(400));
        assert_eq!(policy.backoff_for(&err, 3), Duration::from_millis(800));
    }

    #[test]
    fn test_upstream_backoff_is_flat() {
        let policy = RetryPolicy::default();
        let err = AppError::UpstreamFailure("reset".to_string());
        assert_eq!(policy.backoff_for(&err, 1), Duration::from_millis(200));
        assert_eq!(policy.backoff_for(&err, 3), Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = retry_async(RetryPolicy::immediate(3), "embed", move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(AppError::RateLimited("slow down".to_string()))
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: AppResult<()> = retry_async(RetryPolicy::immediate(3), "embed", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::UpstreamFailure("down".to_string()))
        })
        .await;

        assert!(matches!(result, Err(AppError::UpstreamFailure(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_structural_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: AppResult<()> = retry_async(RetryPolicy::immediate(5), "embed", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::dimension_mismatch(768, 384))
        })
        .await;

        assert!(matches!(result, Err(AppError::DimensionMismatch { .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
