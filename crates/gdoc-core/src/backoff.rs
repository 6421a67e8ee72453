//! Backoff executor
//!
//! Every remote call goes through [`BackoffExecutor::execute`]:
//!
//! ```text
//! attempt ──ok──────────────────────────────▶ return value
//!    │
//!   err ─▶ report ─▶ budget left? ──no──────▶ report give-up, return error
//!                        │yes
//!                        ▼
//!          wait = delay + jitter ─▶ report ─▶ sleep ─▶ delay *= 2 ─▶ attempt
//! ```
//!
//! Reporting is not optional and always precedes the sleep. No wait follows
//! the final attempt.

use crate::config::{RetryPolicy, BACKOFF_MULTIPLIER};
use crate::error::RemoteError;
use rand::Rng;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Observability sink for retry activity
pub trait RetryObserver: Send + Sync {
    /// Attempt `attempt` (1-based) of `operation` failed
    fn attempt_failed(&self, operation: &str, attempt: u32, max_attempts: u32, error: &RemoteError);

    /// About to wait `wait` before the next attempt
    fn waiting(&self, operation: &str, attempt: u32, wait: Duration);

    /// No further attempts will be made; `error` goes to the caller
    fn giving_up(&self, operation: &str, attempts: u32, error: &RemoteError);
}

/// Default observer, reporting through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RetryObserver for TracingObserver {
    fn attempt_failed(&self, operation: &str, attempt: u32, max_attempts: u32, error: &RemoteError) {
        tracing::warn!(operation, attempt, max_attempts, error = %error, "remote call failed");
    }

    fn waiting(&self, operation: &str, attempt: u32, wait: Duration) {
        tracing::warn!(
            operation,
            attempt,
            "retrying in {:.2} seconds",
            wait.as_secs_f64()
        );
    }

    fn giving_up(&self, operation: &str, attempts: u32, error: &RemoteError) {
        tracing::error!(operation, attempts, error = %error, "giving up on remote call");
    }
}

/// Retry-with-backoff wrapper around remote operations
#[derive(Clone)]
pub struct BackoffExecutor {
    policy: RetryPolicy,
    observer: Arc<dyn RetryObserver>,
}

impl BackoffExecutor {
    /// Create executor reporting through `tracing`
    #[inline]
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_observer(policy, Arc::new(TracingObserver))
    }

    /// Create executor with a custom observer
    #[inline]
    #[must_use]
    pub fn with_observer(policy: RetryPolicy, observer: Arc<dyn RetryObserver>) -> Self {
        Self { policy, observer }
    }

    /// Get retry policy
    #[inline]
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation` until it succeeds or the attempt budget is spent
    ///
    /// # Arguments
    /// * `label` - Name of the remote call, used in reports
    /// * `operation` - Produces a fresh attempt each time it is called
    ///
    /// # Errors
    /// The last `RemoteError` once attempts are exhausted, or the first
    /// error the policy's classification refuses to retry.
    pub async fn execute<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, RemoteError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let max_attempts = self.policy.max_attempts();
        let mut current_delay = self.policy.initial_delay;
        let mut attempt = 0;

        loop {
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            attempt += 1;
            self.observer
                .attempt_failed(label, attempt, max_attempts, &error);

            if attempt >= max_attempts || !self.policy.classification.should_retry(&error) {
                self.observer.giving_up(label, attempt, &error);
                return Err(error);
            }

            let wait = current_delay.saturating_add(self.jitter());
            self.observer.waiting(label, attempt, wait);
            tokio::time::sleep(wait).await;
            current_delay = current_delay.saturating_mul(BACKOFF_MULTIPLIER);
        }
    }

    fn jitter(&self) -> Duration {
        if self.policy.max_jitter.is_zero() {
            return Duration::ZERO;
        }
        let fraction: f64 = rand::rng().random_range(0.0..1.0);
        self.policy.max_jitter.mul_f64(fraction)
    }
}

impl fmt::Debug for BackoffExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackoffExecutor")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Default for BackoffExecutor {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryClassification;
    use std::sync::atomic::{AtomicU32, Ordering};
    use parking_lot::Mutex;

    #[derive(Debug, Default)]
    struct Recorder {
        failures: Mutex<Vec<u32>>,
        waits: Mutex<Vec<Duration>>,
        gave_up: Mutex<Option<u32>>,
    }

    impl RetryObserver for Recorder {
        fn attempt_failed(&self, _: &str, attempt: u32, _: u32, _: &RemoteError) {
            self.failures.lock().push(attempt);
        }

        fn waiting(&self, _: &str, _: u32, wait: Duration) {
            self.waits.lock().push(wait);
        }

        fn giving_up(&self, _: &str, attempts: u32, _: &RemoteError) {
            *self.gave_up.lock() = Some(attempts);
        }
    }

    fn executor(policy: RetryPolicy) -> (BackoffExecutor, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let exec = BackoffExecutor::with_observer(policy, recorder.clone());
        (exec, recorder)
    }

    /// Operation that fails `failures` times, then returns the attempt count.
    fn flaky(calls: &AtomicU32, failures: u32) -> impl Future<Output = Result<u32, RemoteError>> + '_ {
        async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= failures {
                Err(RemoteError::unavailable(format!("attempt {n}")))
            } else {
                Ok(n)
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_n_minus_one_failures() {
        let policy = RetryPolicy::new().with_max_retries(5);
        let (exec, recorder) = executor(policy.clone());
        let calls = AtomicU32::new(0);

        let result = exec.execute("test", || flaky(&calls, 4)).await;

        assert_eq!(result.unwrap(), 5);
        assert_eq!(*recorder.failures.lock(), vec![1, 2, 3, 4]);
        assert!(recorder.gave_up.lock().is_none());

        let waits = recorder.waits.lock().clone();
        assert_eq!(waits.len(), 4);
        for (k, wait) in waits.iter().enumerate() {
            let base = policy.base_delay(u32::try_from(k).unwrap());
            assert!(*wait >= base, "wait {k} = {wait:?} below {base:?}");
            assert!(*wait < base + policy.max_jitter);
        }
        assert!(waits.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_returns_last_error_without_trailing_wait() {
        let (exec, recorder) = executor(RetryPolicy::new().with_max_retries(3));
        let calls = AtomicU32::new(0);

        let err = exec
            .execute("test", || flaky(&calls, u32::MAX))
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(err.message(), "attempt 3");
        assert_eq!(recorder.waits.lock().len(), 2);
        assert_eq!(*recorder.gave_up.lock(), Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_for_reported_durations() {
        let (exec, recorder) = executor(
            RetryPolicy::new()
                .with_max_retries(3)
                .with_max_jitter(Duration::ZERO),
        );
        let calls = AtomicU32::new(0);
        let start = tokio::time::Instant::now();

        exec.execute("test", || flaky(&calls, 2)).await.unwrap();

        assert_eq!(
            *recorder.waits.lock(),
            vec![Duration::from_secs(2), Duration::from_secs(4)]
        );
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(6));
        assert!(elapsed < Duration::from_millis(6_050));
    }

    #[tokio::test(start_paused = true)]
    async fn broad_policy_retries_permanent_errors() {
        let (exec, recorder) = executor(RetryPolicy::new().with_max_retries(2));

        let err = exec
            .execute("test", || async {
                Err::<(), _>(RemoteError::permission_denied("no access"))
            })
            .await
            .unwrap_err();

        assert!(!err.is_transient());
        assert_eq!(recorder.failures.lock().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_only_stops_at_permanent_error() {
        let (exec, recorder) = executor(
            RetryPolicy::new()
                .with_max_retries(5)
                .with_classification(RetryClassification::TransientOnly),
        );
        let calls = AtomicU32::new(0);

        let err = exec
            .execute("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(RemoteError::not_found("gone")) }
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), crate::RemoteErrorKind::NotFound);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(recorder.waits.lock().is_empty());
        assert_eq!(*recorder.gave_up.lock(), Some(1));
    }

    #[tokio::test]
    async fn zero_budget_still_attempts_once() {
        let (exec, _) = executor(RetryPolicy::new().with_max_retries(0));
        let calls = AtomicU32::new(0);

        let result = exec.execute("test", || flaky(&calls, 0)).await;
        assert_eq!(result.unwrap(), 1);
    }
}
