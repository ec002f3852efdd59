//! Bounded exponential backoff for idempotent reads.
//!
//! Applied uniformly at the storage-adapter boundary, never per business
//! operation. Writes are not retried here: conditional updates are safe
//! to re-issue, but that decision belongs to the caller, and
//! unconditional writes must never be blindly re-applied.

use std::future::Future;
use std::time::Duration;

use perkhub_core::config::store::RetryConfig;
use perkhub_core::result::AppResult;

/// Run an idempotent read, retrying transient storage failures with
/// bounded exponential backoff.
///
/// Only errors whose kind is retryable (`Storage`) trigger a retry;
/// workflow conflicts and not-found results are returned immediately.
pub async fn with_read_retry<T, F, Fut>(
    policy: &RetryConfig,
    operation: &str,
    mut f: F,
) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt: u32 = 1;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) if e.kind.is_retryable() && attempt < policy.max_attempts => {
                let delay = backoff_delay(policy, attempt);
                tracing::warn!(
                    operation,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Transient storage failure, retrying read"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Delay before the next attempt: `base * 2^(attempt-1)`, capped.
fn backoff_delay(policy: &RetryConfig, attempt: u32) -> Duration {
    let shift = (attempt - 1).min(16);
    let delay = policy.base_delay_ms.saturating_mul(1u64 << shift);
    Duration::from_millis(delay.min(policy.max_delay_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use perkhub_core::error::AppError;
    use std::cell::Cell;

    fn policy() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            base_delay_ms: 10,
            max_delay_ms: 100,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_failures() {
        let calls = Cell::new(0u32);
        let result: AppResult<u32> = with_read_retry(&policy(), "test_read", || {
            let n = calls.get() + 1;
            calls.set(n);
            async move {
                if n < 3 {
                    Err(AppError::storage("connection reset"))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.expect("should succeed on third attempt"), 42);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let calls = Cell::new(0u32);
        let result: AppResult<u32> = with_read_retry(&policy(), "test_read", || {
            calls.set(calls.get() + 1);
            async { Err(AppError::storage("still down")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_does_not_retry_conflicts() {
        let calls = Cell::new(0u32);
        let result: AppResult<u32> = with_read_retry(&policy(), "test_read", || {
            calls.set(calls.get() + 1);
            async { Err(AppError::already_processed("request already resolved")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_backoff_is_capped() {
        let p = policy();
        assert_eq!(backoff_delay(&p, 1), Duration::from_millis(10));
        assert_eq!(backoff_delay(&p, 2), Duration::from_millis(20));
        assert_eq!(backoff_delay(&p, 5), Duration::from_millis(100));
    }
}
