//! Retry policy for transient transport failures.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::error::GraphqlClientError;

/// Retry decision result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after a delay.
    RetryAfter(Duration),
    /// Do not retry.
    DoNotRetry,
}

/// Retry policy configuration.
///
/// [`RetryPolicy::run`] performs up to `max_attempts` guarded calls and
/// then one final unguarded call, so the total attempt ceiling is
/// `max_attempts + 1`. The extra final attempt is deliberate: its outcome,
/// success or failure, is returned as-is instead of being swallowed by the
/// retry loop.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of guarded attempts.
    pub max_attempts: usize,
    /// Base delay for exponential backoff.
    pub base_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Maximum jitter to add to delays.
    pub max_jitter: Duration,
    /// Predicate deciding which failures are worth retrying.
    pub transient: fn(&GraphqlClientError) -> bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            max_jitter: Duration::from_millis(150),
            transient: GraphqlClientError::is_transient,
        }
    }
}

impl RetryPolicy {
    /// Decide whether to retry based on the error and attempt count.
    #[must_use]
    pub fn decide(&self, error: &GraphqlClientError, attempt: usize) -> RetryDecision {
        if !(self.transient)(error) {
            return RetryDecision::DoNotRetry;
        }

        let base_ms = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        let exp =
            2_u64.saturating_pow(u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX));
        let mut delay_ms = base_ms.saturating_mul(exp);
        let max_ms = u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX);
        if delay_ms > max_ms {
            delay_ms = max_ms;
        }
        let jitter_ms = if self.max_jitter.as_millis() > 0 {
            let mut rng = rand::thread_rng();
            let jitter_max = u64::try_from(self.max_jitter.as_millis()).unwrap_or(u64::MAX);
            rng.gen_range(0..=jitter_max)
        } else {
            0
        };
        RetryDecision::RetryAfter(Duration::from_millis(delay_ms + jitter_ms))
    }

    /// Run `operation` under this policy.
    ///
    /// Each transient failure inside the guarded loop is logged and retried
    /// after a backoff delay; a non-transient failure propagates
    /// immediately. When the loop is exhausted one last unguarded call is
    /// made and its result returned.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, GraphqlClientError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GraphqlClientError>>,
    {
        for attempt in 1..=self.max_attempts {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => match self.decide(&err, attempt) {
                    RetryDecision::RetryAfter(delay) => {
                        warn!(
                            attempt,
                            max_attempts = self.max_attempts,
                            error = %err,
                            "transient failure, retrying after {delay:?}"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    RetryDecision::DoNotRetry => return Err(err),
                },
            }
        }

        operation().await
    }
}
