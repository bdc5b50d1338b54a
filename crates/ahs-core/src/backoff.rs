//! Exponential backoff and the bounded retry loop used around every remote call.
//!
//! A call is retried while it fails with a transient error and the next delay is still
//! below the ceiling. The first delay that reaches the ceiling ends the loop and the
//! last error is returned: persistent outages fail fast, while the short window after
//! launch (when tags may not be visible yet) is tolerated.
use std::{future::Future, time::Duration};

use ahs_model::BackoffStrategy;
use tracing::{info, warn};

use crate::error::CoreResult;

/// Deterministic exponential delay generator.
///
/// Yields `first * factor^attempt`, capped at `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
    first: Duration,
    max: Duration,
    factor: f64,
    attempt: u32,
}

impl Backoff {
    /// Creates a cursor starting at `first`, multiplied by `factor` per attempt, capped at `max`.
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use ahs_core::backoff::Backoff;
    ///
    /// let mut b = Backoff::new(Duration::from_millis(100), Duration::from_secs(1), 2.0);
    /// assert_eq!(b.next_delay(), Duration::from_millis(100));
    /// assert_eq!(b.next_delay(), Duration::from_millis(200));
    /// ```
    pub fn new(first: Duration, max: Duration, factor: f64) -> Self {
        Self {
            first,
            max,
            factor,
            attempt: 0,
        }
    }

    /// Cursor described by a configured [`BackoffStrategy`] (milliseconds).
    pub fn from_strategy(s: &BackoffStrategy) -> Self {
        Self::new(
            Duration::from_millis(s.first_ms),
            Duration::from_millis(s.max_ms),
            s.factor,
        )
    }

    /// Returns the delay for the current attempt and advances the cursor.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.delay_for(self.attempt);
        self.attempt = self.attempt.saturating_add(1);
        delay
    }

    /// Restores the cursor to the first delay.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Number of delays handed out since the last reset.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Ceiling of the delay; reaching it ends a retry loop.
    pub fn max(&self) -> Duration {
        self.max
    }

    /// `true` once `delay` reached the ceiling, meaning the caller must give up.
    pub fn is_saturated(&self, delay: Duration) -> bool {
        delay >= self.max
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
        let nanos = self.first.as_nanos() as f64 * self.factor.powi(exp);

        if !nanos.is_finite() || nanos >= self.max.as_nanos() as f64 {
            self.max
        } else {
            Duration::from_nanos(nanos as u64)
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::from_strategy(&BackoffStrategy::default())
    }
}

/// Runs `op` until it succeeds, fails permanently, or the backoff saturates.
///
/// Each call site gets a fresh cursor built from `strategy`. Non-transient errors
/// (see [`crate::error::CoreError::is_transient`]) are returned immediately.
pub async fn retry<T, F, Fut>(strategy: &BackoffStrategy, operation: &str, mut op: F) -> CoreResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CoreResult<T>>,
{
    let mut backoff = Backoff::from_strategy(strategy);

    loop {
        match op().await {
            Ok(value) => {
                backoff.reset();
                return Ok(value);
            }
            Err(err) if !err.is_transient() => return Err(err),
            Err(err) => {
                let delay = backoff.next_delay();
                if backoff.is_saturated(delay) {
                    warn!(operation, attempts = backoff.attempt(), "giving up: {err}");
                    return Err(err);
                }

                info!(
                    operation,
                    attempt = backoff.attempt(),
                    delay_ms = delay.as_millis() as u64,
                    "{err}, retrying in {delay:?}"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    use std::cell::Cell;
    use tokio::time::Instant;

    #[test]
    fn grows_by_factor_until_ceiling() {
        let mut b = Backoff::default();

        let first: Vec<u64> = (0..4).map(|_| b.next_delay().as_millis() as u64).collect();
        assert_eq!(first, vec![100, 200, 400, 800]);

        for _ in 4..11 {
            b.next_delay();
        }
        // 100ms * 2^11 = 204.8s, capped.
        assert_eq!(b.next_delay(), Duration::from_secs(120));
        assert_eq!(b.next_delay(), Duration::from_secs(120));
    }

    #[test]
    fn reset_restores_first_delay() {
        let mut b = Backoff::default();
        b.next_delay();
        b.next_delay();
        b.reset();

        assert_eq!(b.attempt(), 0);
        assert_eq!(b.next_delay(), Duration::from_millis(100));
    }

    #[test]
    fn huge_attempt_counts_do_not_overflow() {
        let mut b = Backoff::default();
        b.attempt = u32::MAX;
        assert_eq!(b.next_delay(), b.max());
        assert_eq!(b.attempt(), u32::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn always_failing_call_stops_when_delay_saturates() {
        let calls = Cell::new(0u32);
        let started = Instant::now();

        let res: CoreResult<()> = retry(&BackoffStrategy::default(), "always-fails", || {
            calls.set(calls.get() + 1);
            async { Err(CoreError::TagStore("unavailable".into())) }
        })
        .await;

        assert!(matches!(res, Err(CoreError::TagStore(_))));
        // 11 sleeps (100ms .. 102.4s), then the 12th delay hits the 120s ceiling.
        assert_eq!(calls.get(), 12);
        let slept = started.elapsed();
        assert!(slept >= Duration::from_millis(204_700), "slept {slept:?}");
        assert!(slept < Duration::from_secs(205), "slept {slept:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried_until_success() {
        let calls = Cell::new(0u32);

        let res = retry(&BackoffStrategy::default(), "flaky", || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move {
                if n < 4 {
                    Err(CoreError::Metadata("503".into()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(res.unwrap(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_errors_are_not_retried() {
        let calls = Cell::new(0u32);

        let res: CoreResult<()> = retry(&BackoffStrategy::default(), "data", || {
            calls.set(calls.get() + 1);
            async {
                Err(CoreError::InvalidSequentialTagValue {
                    resource: "i-1".into(),
                    value: "abc".into(),
                })
            }
        })
        .await;

        assert!(res.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn tight_ceiling_gives_up_quickly() {
        let strategy = BackoffStrategy {
            first_ms: 10,
            max_ms: 40,
            factor: 2.0,
        };
        let calls = Cell::new(0u32);

        let _ = retry::<(), _, _>(&strategy, "tight", || {
            calls.set(calls.get() + 1);
            async { Err(CoreError::TagStore("down".into())) }
        })
        .await;

        // delays: 10, 20, then 40 == ceiling.
        assert_eq!(calls.get(), 3);
    }
}
