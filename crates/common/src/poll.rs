//! Bounded condition polling
//!
//! [`Poll`] evaluates a callable at a fixed cadence until a stop condition
//! holds or a deadline passes. The callable always runs at least once and
//! the deadline is checked after every evaluation, so a condition that is
//! already true returns without sleeping.
//!
//! The deadline is whole seconds: a timeout of 1.9s behaves as 1s.
//!
//! Errors returned by the callable in the `try_*` variants are passed
//! straight back to the caller. Polling only governs timing.

use crate::config::PollConfig;
use std::convert::Infallible;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How a poll ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Satisfied { attempts: u32, elapsed: Duration },
    TimedOut { attempts: u32, elapsed: Duration },
}

impl PollOutcome {
    pub fn timed_out(&self) -> bool {
        matches!(self, PollOutcome::TimedOut { .. })
    }

    pub fn is_satisfied(&self) -> bool {
        !self.timed_out()
    }

    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Satisfied { attempts, .. } | PollOutcome::TimedOut { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            PollOutcome::Satisfied { elapsed, .. } | PollOutcome::TimedOut { elapsed, .. } => {
                *elapsed
            }
        }
    }

    /// Turn a timeout into `Error::Timeout` naming what was awaited
    pub fn into_result(self, what: &str) -> crate::Result<Duration> {
        match self {
            PollOutcome::Satisfied { elapsed, .. } => Ok(elapsed),
            PollOutcome::TimedOut { elapsed, .. } => Err(crate::Error::Timeout {
                what: what.to_string(),
                seconds: elapsed.as_secs(),
            }),
        }
    }
}

/// Polling cadence: a whole-second deadline and a sleep between evaluations
#[derive(Debug, Clone, Copy)]
pub struct Poll {
    timeout: Duration,
    frequency: Duration,
}

impl Default for Poll {
    fn default() -> Self {
        Self::from_config(&PollConfig::default())
    }
}

impl Poll {
    pub fn new(timeout: Duration, frequency: Duration) -> Self {
        Self {
            timeout: Duration::from_secs(timeout.as_secs()),
            frequency,
        }
    }

    pub fn from_config(config: &PollConfig) -> Self {
        Self::new(config.timeout(), config.frequency())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn frequency(&self) -> Duration {
        self.frequency
    }

    /// Wait until `f` returns true
    pub fn wait_until_true(&self, mut f: impl FnMut() -> bool) -> PollOutcome {
        infallible(self.run(|| Ok(f()), |v: &bool| *v))
    }

    /// Wait until `f` returns false
    pub fn wait_until_false(&self, mut f: impl FnMut() -> bool) -> PollOutcome {
        infallible(self.run(|| Ok(f()), |v: &bool| !*v))
    }

    /// Wait until `f` produces a value equal to `expectation`
    pub fn wait_until_equal<T: PartialEq>(
        &self,
        expectation: &T,
        mut f: impl FnMut() -> T,
    ) -> PollOutcome {
        infallible(self.run(|| Ok(f()), |v: &T| v == expectation))
    }

    /// Wait until `f` produces a value different from `expectation`
    pub fn wait_until_not_equal<T: PartialEq>(
        &self,
        expectation: &T,
        mut f: impl FnMut() -> T,
    ) -> PollOutcome {
        infallible(self.run(|| Ok(f()), |v: &T| v != expectation))
    }

    pub fn try_wait_until_true<E>(
        &self,
        f: impl FnMut() -> Result<bool, E>,
    ) -> Result<PollOutcome, E> {
        self.run(f, |v: &bool| *v)
    }

    pub fn try_wait_until_false<E>(
        &self,
        f: impl FnMut() -> Result<bool, E>,
    ) -> Result<PollOutcome, E> {
        self.run(f, |v: &bool| !*v)
    }

    pub fn try_wait_until_equal<T: PartialEq, E>(
        &self,
        expectation: &T,
        f: impl FnMut() -> Result<T, E>,
    ) -> Result<PollOutcome, E> {
        self.run(f, |v: &T| v == expectation)
    }

    pub fn try_wait_until_not_equal<T: PartialEq, E>(
        &self,
        expectation: &T,
        f: impl FnMut() -> Result<T, E>,
    ) -> Result<PollOutcome, E> {
        self.run(f, |v: &T| v != expectation)
    }

    fn run<T, E>(
        &self,
        mut eval: impl FnMut() -> Result<T, E>,
        stop: impl Fn(&T) -> bool,
    ) -> Result<PollOutcome, E> {
        let start = Instant::now();
        let deadline = start + self.timeout;
        let mut attempts = 0;

        loop {
            let value = eval()?;
            attempts += 1;

            if stop(&value) {
                debug!("Condition met after {} attempt(s)", attempts);
                return Ok(PollOutcome::Satisfied {
                    attempts,
                    elapsed: start.elapsed(),
                });
            }
            if Instant::now() > deadline {
                warn!(
                    "Condition not met within {}s ({} attempts)",
                    self.timeout.as_secs(),
                    attempts
                );
                return Ok(PollOutcome::TimedOut {
                    attempts,
                    elapsed: start.elapsed(),
                });
            }
            std::thread::sleep(self.frequency);
        }
    }

    pub async fn wait_until_true_async<F, Fut>(&self, mut f: F) -> PollOutcome
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        let eval = || {
            let fut = f();
            async move { Ok::<_, Infallible>(fut.await) }
        };
        infallible(self.run_async(eval, |v: &bool| *v).await)
    }

    pub async fn wait_until_false_async<F, Fut>(&self, mut f: F) -> PollOutcome
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        let eval = || {
            let fut = f();
            async move { Ok::<_, Infallible>(fut.await) }
        };
        infallible(self.run_async(eval, |v: &bool| !*v).await)
    }

    pub async fn wait_until_equal_async<T, F, Fut>(&self, expectation: &T, mut f: F) -> PollOutcome
    where
        T: PartialEq,
        F: FnMut() -> Fut,
        Fut: Future<Output = T>,
    {
        let eval = || {
            let fut = f();
            async move { Ok::<_, Infallible>(fut.await) }
        };
        infallible(self.run_async(eval, |v: &T| v == expectation).await)
    }

    pub async fn wait_until_not_equal_async<T, F, Fut>(
        &self,
        expectation: &T,
        mut f: F,
    ) -> PollOutcome
    where
        T: PartialEq,
        F: FnMut() -> Fut,
        Fut: Future<Output = T>,
    {
        let eval = || {
            let fut = f();
            async move { Ok::<_, Infallible>(fut.await) }
        };
        infallible(self.run_async(eval, |v: &T| v != expectation).await)
    }

    pub async fn try_wait_until_true_async<E, F, Fut>(&self, f: F) -> Result<PollOutcome, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool, E>>,
    {
        self.run_async(f, |v: &bool| *v).await
    }

    async fn run_async<T, E, F, Fut>(
        &self,
        mut eval: F,
        stop: impl Fn(&T) -> bool,
    ) -> Result<PollOutcome, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let start = Instant::now();
        let deadline = start + self.timeout;
        let mut attempts = 0;

        loop {
            let value = eval().await?;
            attempts += 1;

            if stop(&value) {
                return Ok(PollOutcome::Satisfied {
                    attempts,
                    elapsed: start.elapsed(),
                });
            }
            if Instant::now() > deadline {
                warn!(
                    "Condition not met within {}s ({} attempts)",
                    self.timeout.as_secs(),
                    attempts
                );
                return Ok(PollOutcome::TimedOut {
                    attempts,
                    elapsed: start.elapsed(),
                });
            }
            tokio::time::sleep(self.frequency).await;
        }
    }
}

fn infallible(result: Result<PollOutcome, Infallible>) -> PollOutcome {
    match result {
        Ok(outcome) => outcome,
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn poll(timeout_secs: u64, frequency_ms: u64) -> Poll {
        Poll::new(
            Duration::from_secs(timeout_secs),
            Duration::from_millis(frequency_ms),
        )
    }

    #[test]
    fn test_already_true_returns_without_sleeping() {
        let outcome = poll(5, 1000).wait_until_true(|| true);
        assert!(outcome.is_satisfied());
        assert_eq!(outcome.attempts(), 1);
        assert!(outcome.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn test_true_on_third_evaluation() {
        let calls = Cell::new(0);
        let outcome = poll(1, 200).wait_until_true(|| {
            calls.set(calls.get() + 1);
            calls.get() >= 3
        });

        assert!(outcome.is_satisfied());
        assert_eq!(outcome.attempts(), 3);
        assert!(outcome.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_never_true_times_out_within_bounds() {
        let started = Instant::now();
        let outcome = poll(1, 200).wait_until_true(|| false);
        let waited = started.elapsed();

        assert!(outcome.timed_out());
        assert!(waited >= Duration::from_secs(1));
        assert!(waited <= Duration::from_millis(1200 + 150));
    }

    #[test]
    fn test_timeout_is_truncated_to_whole_seconds() {
        let p = Poll::new(Duration::from_millis(1900), Duration::from_millis(10));
        assert_eq!(p.timeout(), Duration::from_secs(1));

        let zero = Poll::new(Duration::from_millis(500), Duration::from_millis(10));
        let outcome = zero.wait_until_true(|| false);
        assert!(outcome.timed_out());
        assert!(outcome.attempts() <= 2);
    }

    #[test]
    fn test_from_config() {
        let config = PollConfig {
            timeout_secs: 3,
            frequency_ms: 25,
        };
        let p = Poll::from_config(&config);
        assert_eq!(p.timeout(), Duration::from_secs(3));
        assert_eq!(p.frequency(), Duration::from_millis(25));
        assert_eq!(Poll::default().frequency(), Duration::from_millis(500));
    }

    #[test]
    fn test_until_false() {
        let calls = Cell::new(0);
        let outcome = poll(1, 10).wait_until_false(|| {
            calls.set(calls.get() + 1);
            calls.get() < 4
        });
        assert!(outcome.is_satisfied());
        assert_eq!(outcome.attempts(), 4);

        assert!(poll(0, 10).wait_until_false(|| true).timed_out());
    }

    #[test]
    fn test_until_equal_and_not_equal() {
        let counter = Cell::new(0);
        let outcome = poll(1, 10).wait_until_equal(&5, || {
            counter.set(counter.get() + 1);
            counter.get()
        });
        assert!(outcome.is_satisfied());
        assert_eq!(counter.get(), 5);

        let status = Cell::new("loading");
        let outcome = poll(1, 10).wait_until_not_equal(&"loading", || {
            let current = status.get();
            status.set("ready");
            current
        });
        assert_eq!(outcome.attempts(), 2);

        assert!(poll(0, 10).wait_until_equal(&"ready", || "loading").timed_out());
        assert!(poll(0, 10).wait_until_not_equal(&1, || 1).timed_out());
    }

    #[test]
    fn test_callable_error_propagates_immediately() {
        let calls = Cell::new(0);
        let result: Result<PollOutcome, String> = poll(5, 10).try_wait_until_true(|| {
            calls.set(calls.get() + 1);
            if calls.get() == 2 {
                Err("element detached".to_string())
            } else {
                Ok(false)
            }
        });

        assert_eq!(result.unwrap_err(), "element detached");
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_into_result() {
        assert!(poll(0, 10).wait_until_true(|| true).into_result("ready").is_ok());

        let err = poll(0, 10)
            .wait_until_true(|| false)
            .into_result("spinner gone")
            .unwrap_err();
        assert!(err.to_string().contains("spinner gone"));
    }

    #[tokio::test]
    async fn test_async_until_true() {
        let calls = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));
        let counter = calls.clone();
        let outcome = poll(1, 20)
            .wait_until_true_async(move || {
                let counter = counter.clone();
                async move { counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst) >= 2 }
            })
            .await;

        assert!(outcome.is_satisfied());
        assert_eq!(outcome.attempts(), 3);
    }

    #[tokio::test]
    async fn test_async_timeout_and_error() {
        let outcome = poll(0, 10).wait_until_equal_async(&1, || async { 0 }).await;
        assert!(outcome.timed_out());

        let result: Result<PollOutcome, &str> = poll(1, 10)
            .try_wait_until_true_async(|| async { Err("driver gone") })
            .await;
        assert_eq!(result.unwrap_err(), "driver gone");
    }
}
