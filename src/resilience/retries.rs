//! Bounded retry with jittered exponential backoff.
//!
//! Attempts run sequentially. Each failure waits [`retry_delay`] (jittered) before
//! the next attempt; the wait is cancellable. The engine knows nothing about what it
//! retries: callers decide which failures are worth another attempt with
//! [`RetryPolicy::run_if`].

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

use crate::config::schema::RetryConfig;
use crate::lifecycle::Cancellation;
use crate::observability::metrics;
use crate::resilience::backoff::{apply_jitter, retry_delay, DEFAULT_JITTER, MAX_RETRY_WAIT};

/// Why a retried operation ultimately failed.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Every allowed attempt failed.
    #[error("number of retries exceeded ({attempts} attempts): {last}")]
    Exhausted { attempts: u32, last: E },

    /// A failure the caller marked as not worth retrying.
    #[error("{0}")]
    Aborted(E),

    /// The cancellation token fired while waiting between attempts.
    #[error("retry cancelled after {attempts} attempts")]
    Cancelled { attempts: u32, last: Option<E> },
}

impl<E> RetryError<E> {
    /// The most recent underlying failure, if any.
    pub fn last_error(&self) -> Option<&E> {
        match self {
            RetryError::Exhausted { last, .. } => Some(last),
            RetryError::Aborted(e) => Some(e),
            RetryError::Cancelled { last, .. } => last.as_ref(),
        }
    }
}

/// Attempt bookkeeping for one `run` invocation.
#[derive(Debug)]
struct RetryContext {
    attempt: u32,
    max_attempts: u32,
}

impl RetryContext {
    fn new(max_attempts: u32) -> Self {
        // Always try at least once.
        Self {
            attempt: 0,
            max_attempts: max_attempts.max(1),
        }
    }

    fn record_attempt(&mut self) {
        self.attempt += 1;
    }

    fn exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }
}

/// Retry policy: attempt budget, wait ceiling and jitter ratio.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub max_wait: Duration,
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            max_wait: MAX_RETRY_WAIT,
            jitter: DEFAULT_JITTER,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            max_wait: Duration::from_millis(config.max_wait_ms),
            jitter: config.jitter,
        }
    }
}

impl RetryPolicy {
    /// Policy with the default curve and `max_attempts` attempts.
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Jittered wait after failed attempt `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        apply_jitter(retry_delay(attempt, self.max_wait), self.jitter, self.max_wait)
    }

    /// Retry `op` on every failure.
    pub async fn run<T, E, F, Fut>(&self, cancel: &Cancellation, op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.run_if(cancel, |_| true, op).await
    }

    /// Retry `op` while `should_retry` accepts the failure.
    pub async fn run_if<T, E, F, Fut, P>(
        &self,
        cancel: &Cancellation,
        should_retry: P,
        mut op: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        let mut ctx = RetryContext::new(self.max_attempts);

        loop {
            let result = op().await;
            ctx.record_attempt();

            let error = match result {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if !should_retry(&error) {
                return Err(RetryError::Aborted(error));
            }

            if ctx.exhausted() {
                tracing::warn!(
                    attempts = ctx.attempt,
                    error = %error,
                    "Number of retries exceeded"
                );
                return Err(RetryError::Exhausted {
                    attempts: ctx.attempt,
                    last: error,
                });
            }

            let wait = self.delay_for(ctx.attempt - 1);
            tracing::warn!(
                attempt = ctx.attempt,
                max_attempts = ctx.max_attempts,
                wait_ms = wait.as_millis() as u64,
                error = %error,
                "Operation failed, will retry"
            );
            metrics::record_retry();

            tokio::select! {
                _ = sleep(wait) => {}
                _ = cancel.cancelled() => {
                    tracing::info!(attempts = ctx.attempt, "Retry cancelled");
                    return Err(RetryError::Cancelled {
                        attempts: ctx.attempt,
                        last: Some(error),
                    });
                }
            }
        }
    }
}

/// Run `op` up to `max_attempts` times with the default backoff curve.
pub async fn with_retries<T, E, F, Fut>(max_attempts: u32, op: F) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    RetryPolicy::with_max_attempts(max_attempts)
        .run(&Cancellation::never(), op)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::CancelHandle;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_first_success_returns_immediately() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let started = Instant::now();

        let result: Result<u32, RetryError<String>> = with_retries(5, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(7)
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_kth_attempt() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result = with_retries(5, move || async move {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                Err(format!("attempt {} failed", n))
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_after_exactly_n_attempts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: Result<(), _> = with_retries(4, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err("boom")
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        match result {
            Err(RetryError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 4);
                assert_eq!(last, "boom");
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_and_one_attempt_still_try_once() {
        for max in [0, 1] {
            let calls = AtomicU32::new(0);
            let counter = &calls;
            let started = Instant::now();

            let result: Result<(), _> = with_retries(max, move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err("nope")
            })
            .await;

            assert_eq!(calls.load(Ordering::SeqCst), 1);
            assert!(matches!(result, Err(RetryError::Exhausted { attempts: 1, .. })));
            // No wait after the final attempt.
            assert_eq!(started.elapsed(), Duration::ZERO);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_between_attempts() {
        let policy = RetryPolicy {
            max_attempts: 3,
            max_wait: MAX_RETRY_WAIT,
            jitter: 0.0,
        };
        let started = Instant::now();

        let _: Result<(), _> = policy
            .run(&Cancellation::never(), || async { Err("fail") })
            .await;

        // 1000ms after the first failure, 1000^(7/6) = 3162ms after the second.
        assert_eq!(started.elapsed(), Duration::from_millis(1000 + 3162));
    }

    #[tokio::test(start_paused = true)]
    async fn test_predicate_aborts_without_waiting() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = RetryPolicy::with_max_attempts(5);

        let result: Result<(), _> = policy
            .run_if(
                &Cancellation::never(),
                |e: &&str| *e == "transient",
                move || async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    if n == 0 {
                        Err("transient")
                    } else {
                        Err("fatal")
                    }
                },
            )
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(matches!(result, Err(RetryError::Aborted("fatal"))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff() {
        let handle = CancelHandle::new();
        let token = handle.token();
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::with_max_attempts(10);

        let result: Result<(), _> = policy
            .run(&token, || {
                calls.fetch_add(1, Ordering::SeqCst);
                handle.cancel();
                async { Err("down") }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        match result {
            Err(RetryError::Cancelled { attempts, last }) => {
                assert_eq!(attempts, 1);
                assert_eq!(last, Some("down"));
            }
            other => panic!("expected cancellation, got {:?}", other),
        }
    }

    #[test]
    fn test_error_display() {
        let err: RetryError<String> = RetryError::Exhausted {
            attempts: 3,
            last: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("number of retries exceeded"));
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(err.last_error().map(String::as_str), Some("connection refused"));
    }
}
