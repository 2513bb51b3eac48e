//! Bounded exponential-backoff retry for transient browser operations
//!
//! Only operations whose failure is plausibly transient (navigation) are
//! wrapped. Per-item extraction has its own skip-on-failure handling and is
//! never retried here.

use crate::config::CrawlConfig;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry discipline: up to `max_attempts` invocations, doubling delays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy; at least one attempt is always made
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn from_config(config: &CrawlConfig) -> Self {
        Self::new(config.max_retries, config.retry_base_delay())
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before retry `retry` (1-indexed): `base_delay * 2^(retry - 1)`
    ///
    /// The delay before attempt `k` is `backoff_delay(k - 1)`.
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1);
        let factor = 2u32.checked_pow(exponent).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Runs `op` until it succeeds or the attempts are exhausted
    ///
    /// # Arguments
    ///
    /// * `operation` - Name used in log events
    /// * `op` - Produces a fresh future for every attempt
    ///
    /// # Returns
    ///
    /// The first success, or the error of the final attempt
    pub async fn run<T, E, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation, attempt, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if attempt >= self.max_attempts => {
                    warn!(operation, attempt, "Giving up: {}", e);
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.backoff_delay(attempt);
                    warn!(
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Attempt failed, retrying: {}",
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::time::Instant;

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::new(5, Duration::from_secs(1));
        let delays: Vec<u64> = (1..=4).map(|k| policy.backoff_delay(k).as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8]);
    }

    #[test]
    fn test_backoff_saturates() {
        let policy = RetryPolicy::new(100, Duration::from_secs(1));
        assert_eq!(policy.backoff_delay(64), Duration::from_secs(u32::MAX as u64));
    }

    #[test]
    fn test_zero_attempts_still_runs_once() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_operation() {
        let policy = RetryPolicy::new(5, Duration::from_secs(1));
        let calls: Mutex<Vec<Instant>> = Mutex::new(Vec::new());
        let start = Instant::now();

        let result: Result<(), String> = policy
            .run("navigation", || {
                let attempt = {
                    let mut calls = calls.lock().unwrap();
                    calls.push(Instant::now());
                    calls.len()
                };
                async move { Err(format!("failure {}", attempt)) }
            })
            .await;

        // The last attempt's error is surfaced
        assert_eq!(result.unwrap_err(), "failure 5");

        let calls = calls.into_inner().unwrap();
        assert_eq!(calls.len(), 5);
        let gaps: Vec<u64> = calls
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).as_secs())
            .collect();
        assert_eq!(gaps, vec![1, 2, 4, 8]);
        assert_eq!(start.elapsed(), Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_on_later_attempt() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100));
        let mut attempts = 0;

        let result: Result<&str, String> = policy
            .run("navigation", || {
                attempts += 1;
                let attempt = attempts;
                async move {
                    if attempt < 3 {
                        Err("timeout".to_string())
                    } else {
                        Ok("loaded")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "loaded");
        assert_eq!(attempts, 3);
    }
}
