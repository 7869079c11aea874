//! Retry logic.
//!
//! # Responsibilities
//! - Run an async operation up to `max_attempts` times
//! - Sleep a fixed delay between failed attempts
//! - Surface only the final attempt's error
//!
//! # Design Decisions
//! - Fixed delay, no jitter: a batch run talks to a single backend and the
//!   total worst-case latency must stay predictable
//! - Intermediate failures are logged at debug level only
//! - `trailing_delay` keeps the legacy pause after a successful last attempt
//! - `run_until` cuts a pause short on shutdown and gives up with the error
//!   in hand, so a cancelled run never waits out a retry delay

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::lifecycle::Shutdown;

/// Bounded fixed-delay retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub trailing_delay: bool,
}

impl RetryPolicy {
    /// Policy without the trailing pause.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            trailing_delay: false,
        }
    }

    /// Policy that never sleeps, for operations that retry immediately.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::fixed(max_attempts, Duration::ZERO)
    }

    /// Run `op` until it succeeds or the attempts are exhausted.
    ///
    /// `op` receives the 1-based attempt number.
    pub async fn run<T, E, F, Fut>(&self, op: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.attempt_loop(None, op).await
    }

    /// Like [`run`](Self::run), but a shutdown during a pause ends the loop.
    ///
    /// An interrupted retry returns the error of the attempt just made; an
    /// interrupted trailing pause still returns the value.
    pub async fn run_until<T, E, F, Fut>(&self, shutdown: &Shutdown, op: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.attempt_loop(Some(shutdown), op).await
    }

    async fn attempt_loop<T, E, F, Fut>(&self, shutdown: Option<&Shutdown>, mut op: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op(attempt).await {
                Ok(value) => {
                    if self.trailing_delay {
                        self.pause(shutdown).await;
                    }
                    return Ok(value);
                }
                Err(e) if attempt >= attempts => return Err(e),
                Err(e) => {
                    tracing::debug!(attempt, max_attempts = attempts, error = %e, "Attempt failed, retrying");
                    if !self.pause(shutdown).await {
                        tracing::debug!(attempt, "Shutdown during retry pause, giving up");
                        return Err(e);
                    }
                }
            }
            attempt += 1;
        }
    }

    /// Sleep the policy delay. Returns false if shutdown cut it short.
    async fn pause(&self, shutdown: Option<&Shutdown>) -> bool {
        if self.delay.is_zero() {
            return true;
        }
        match shutdown {
            Some(shutdown) => tokio::select! {
                _ = tokio::time::sleep(self.delay) => true,
                _ = shutdown.wait() => false,
            },
            None => {
                tokio::time::sleep(self.delay).await;
                true
            }
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            delay: Duration::from_millis(config.delay_ms),
            trailing_delay: config.trailing_delay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    async fn failing_until(policy: RetryPolicy, succeed_on: u32, calls: &AtomicU32) -> Result<u32, String> {
        policy
            .run(|attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt >= succeed_on {
                        Ok(attempt)
                    } else {
                        Err(format!("attempt {} failed", attempt))
                    }
                }
            })
            .await
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_third_attempt() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result = failing_until(RetryPolicy::fixed(3, Duration::from_secs(1)), 3, &calls).await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_trailing_delay_after_success() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();
        let policy = RetryPolicy {
            trailing_delay: true,
            ..RetryPolicy::fixed(3, Duration::from_secs(1))
        };

        let result = failing_until(policy, 3, &calls).await;

        assert_eq!(result, Ok(3));
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_returns_last_error() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result = failing_until(RetryPolicy::fixed(3, Duration::from_secs(1)), 10, &calls).await;

        assert_eq!(result, Err("attempt 3 failed".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // no pause after the final failure
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cuts_retry_pause_short() {
        let shutdown = Shutdown::new();
        let calls = AtomicU32::new(0);
        let start = Instant::now();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            trigger.trigger();
        });

        let result: Result<u32, String> = RetryPolicy::fixed(5, Duration::from_secs(1))
            .run_until(&shutdown, |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Err(format!("attempt {} failed", attempt)) }
            })
            .await;

        assert_eq!(result, Err("attempt 2 failed".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(start.elapsed(), Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_shut_down_makes_one_attempt() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result: Result<u32, String> = RetryPolicy::fixed(3, Duration::from_secs(1))
            .run_until(&shutdown, |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt == 1 {
                        Err("first".to_string())
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert_eq!(result, Err("first".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_runs_once() {
        let calls = AtomicU32::new(0);
        let result = failing_until(RetryPolicy::immediate(0), 1, &calls).await;
        assert_eq!(result, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_from_config() {
        let policy = RetryPolicy::from(&RetryConfig::default());
        assert_eq!(policy, RetryPolicy::fixed(3, Duration::from_secs(1)));
    }
}
