use std::future::Future;
use std::time::Duration;

use repohub::BackendError;

/// Linear retry schedule: attempt `n` waits `base_delay * n` before the
/// next try, up to `max_attempts` tries in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// Outcome of one failed attempt.
#[derive(Debug)]
pub enum AttemptError {
    /// Worth trying again (connection failure, 5xx).
    Retryable(BackendError),
    /// Trying again would give the same answer.
    Fatal(BackendError),
}

/// Run `attempt` until it succeeds, fails fatally, or the policy is exhausted.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut attempt: F) -> Result<T, BackendError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, AttemptError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut n = 1;

    loop {
        match attempt(n).await {
            Ok(value) => return Ok(value),
            Err(AttemptError::Fatal(e)) => return Err(e),
            Err(AttemptError::Retryable(e)) if n >= max_attempts => return Err(e),
            Err(AttemptError::Retryable(e)) => {
                let delay = policy.delay_after(n);
                tracing::debug!(attempt = n, ?delay, error = %e, "retrying request");
                tokio::time::sleep(delay).await;
                n += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn delay_grows_linearly() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
        };
        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(2), Duration::from_millis(200));
    }

    #[tokio::test]
    async fn succeeds_after_retryable_failures() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast(3), |n| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 3 {
                    Err(AttemptError::Retryable(BackendError::Transport("503".into())))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&fast(2), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AttemptError::Retryable(BackendError::Transport("reset".into()))) }
        })
        .await;

        assert!(result.unwrap_err().is_transport());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn fatal_error_stops_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&fast(5), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AttemptError::Fatal(BackendError::not_found("x"))) }
        })
        .await;

        assert!(result.unwrap_err().is_not_found());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_attempts_still_tries_once() {
        let policy = RetryPolicy {
            max_attempts: 0,
            base_delay: Duration::ZERO,
        };
        let result = with_retry(&policy, |n| async move { Ok::<_, AttemptError>(n) }).await;
        assert_eq!(result.unwrap(), 1);
    }
}
