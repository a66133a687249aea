//! Retry policy for transient provider failures.
//!
//! Only rate-limit responses are retried. Delays grow geometrically from
//! `initial_delay` by `multiplier`, capped at `max_delay`. There is no sleep
//! after the last attempt, and the last error is what the caller sees.

use std::future::Future;
use std::time::Duration;

use gena_core::error::{Error, ProviderError};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::cancel::{CancelAware, await_or_cancel, is_cancelled};

/// Backoff parameters for rate-limited provider calls.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(1),
            multiplier: 1.5,
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Delay before retry `n` (1-based): `initial * multiplier^(n-1)`, capped.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let max = self.max_delay.as_secs_f64();
        if !secs.is_finite() || secs >= max {
            self.max_delay
        } else {
            Duration::from_secs_f64(secs.max(0.0))
        }
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent.
    ///
    /// The token is checked before every attempt and before every sleep, and
    /// both the attempt and the sleep race it.
    pub async fn run<T, F, Fut>(
        &self,
        cancel: Option<&CancellationToken>,
        mut op: F,
    ) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            if is_cancelled(cancel) {
                return Err(Error::Cancelled);
            }

            let err = match await_or_cancel(cancel, op()).await {
                CancelAware::Cancelled => return Err(Error::Cancelled),
                CancelAware::Value(Ok(value)) => return Ok(value),
                CancelAware::Value(Err(e)) => e,
            };

            if !err.is_rate_limit() || attempt >= max_attempts {
                return Err(Error::Provider(err));
            }

            let delay = self.delay_for(attempt);
            warn!(
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                "Rate limited by provider, backing off"
            );

            if is_cancelled(cancel) {
                return Err(Error::Cancelled);
            }
            if let CancelAware::Cancelled =
                await_or_cancel(cancel, tokio::time::sleep(delay)).await
            {
                return Err(Error::Cancelled);
            }

            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn rate_limited() -> ProviderError {
        ProviderError::RateLimited {
            retry_after_secs: 1,
        }
    }

    #[test]
    fn default_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1500));
        assert_eq!(policy.delay_for(3), Duration::from_millis(2250));
        assert_eq!(policy.delay_for(4), Duration::from_millis(3375));
    }

    #[test]
    fn delay_is_capped() {
        let policy = RetryPolicy::default().with_max_delay(Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(2));
        assert_eq!(policy.delay_for(500), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_rate_limits_until_budget_is_spent() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let start = tokio::time::Instant::now();

        let result: Result<(), Error> = RetryPolicy::default()
            .run(None, || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(rate_limited()) }
            })
            .await;

        assert!(matches!(
            result,
            Err(Error::Provider(ProviderError::RateLimited { .. }))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        // 1 + 1.5 + 2.25 + 3.375, and nothing after the fifth attempt.
        assert_eq!(start.elapsed(), Duration::from_millis(8125));
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_transient_rate_limit() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = RetryPolicy::default()
            .run(None, || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move { if n < 2 { Err(rate_limited()) } else { Ok("done") } }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), Error> = RetryPolicy::default()
            .run(None, || {
                counter.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(ProviderError::ApiError {
                        status_code: 500,
                        message: "boom".into(),
                    })
                }
            })
            .await;

        assert!(matches!(
            result,
            Err(Error::Provider(ProviderError::ApiError { status_code: 500, .. }))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_backoff() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            trigger.cancel();
        });

        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), Error> = RetryPolicy::default()
            .run(Some(&token), || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(rate_limited()) }
            })
            .await;

        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancelled_before_first_attempt() {
        let token = CancellationToken::new();
        token.cancel();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), Error> = RetryPolicy::none()
            .run(Some(&token), || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            })
            .await;

        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
