//! Bounded retry with a fixed delay between attempts.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// How often and how patiently an operation is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Pause between consecutive attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Policy that never waits between attempts.
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            delay: Duration::ZERO,
        }
    }
}

/// Every attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} failed after {attempts} attempt(s): {last_error}")]
pub struct RetryExhausted {
    /// Operation name.
    pub operation: String,
    /// Attempts made.
    pub attempts: u32,
    /// Failure reported by the final attempt.
    pub last_error: String,
}

/// Runs `attempt` until it succeeds or the policy's attempts are used up.
///
/// The closure receives the 1-based attempt number. A failed attempt is
/// logged at warn level; the delay is applied between attempts only, never
/// after the last one.
pub async fn retry_with_delay<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut attempt: F,
) -> Result<T, RetryExhausted>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, String>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = String::new();

    for n in 1..=max_attempts {
        match attempt(n).await {
            Ok(value) => {
                if n > 1 {
                    debug!(operation, attempt = n, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) => {
                warn!(
                    operation,
                    attempt = n,
                    max_attempts,
                    error = %e,
                    "Attempt failed"
                );
                last_error = e;
                if n < max_attempts && !policy.delay.is_zero() {
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }
    }

    Err(RetryExhausted {
        operation: operation.to_string(),
        attempts: max_attempts,
        last_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_first_attempt_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = retry_with_delay(&RetryPolicy::immediate(3), "op", move |_| async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(7)
        })
        .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_success_on_second_attempt() {
        let result = retry_with_delay(&RetryPolicy::immediate(2), "op", |n| async move {
            if n == 1 {
                Err("transient".to_string())
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(result, Ok(2));
    }

    #[tokio::test]
    async fn test_exhausted_keeps_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> =
            retry_with_delay(&RetryPolicy::immediate(2), "add_liquidity", |n| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Err(format!("failure {n}")) }
            })
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.attempts, 2);
        assert_eq!(err.last_error, "failure 2");
        assert_eq!(err.operation, "add_liquidity");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_only_between_attempts() {
        let policy = RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        };
        let started = tokio::time::Instant::now();
        let _ = retry_with_delay(&policy, "op", |_| async { Err::<(), _>("x".to_string()) }).await;

        assert_eq!(started.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_zero_attempts_runs_once() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let _ = retry_with_delay(&RetryPolicy::immediate(0), "op", move |_| async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>("x".to_string())
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
