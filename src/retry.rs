use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::metrics::RETRIES;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Fixed-delay retry. Every error is retried the same way; once attempts run
/// out the last error is handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    // Zero is treated as a single attempt
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    pub async fn execute<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let attempts = self.attempts();
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts => {
                    RETRIES.inc();
                    warn!(attempt, max_retries = attempts, error = %e, "retry {}/{}", attempt, attempts);
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::ZERO)
    }

    #[tokio::test]
    async fn returns_first_success() {
        let calls = &AtomicU32::new(0);
        let result: Result<&str, String> = fast(3)
            .execute(|| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("done")
            })
            .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn succeeds_on_last_attempt() {
        let calls = &AtomicU32::new(0);
        let result: Result<u32, String> = fast(3)
            .execute(|| async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 { Err(format!("attempt {} failed", n)) } else { Ok(n) }
            })
            .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_return_last_error() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), String> = fast(4)
            .execute(|| async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Err(format!("failure {}", n))
            })
            .await;
        assert_eq!(result.unwrap_err(), "failure 4");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn zero_retries_still_attempts_once() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), String> = fast(0)
            .execute(|| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("nope".to_string())
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn sleeps_between_attempts_only() {
        let policy = RetryPolicy::new(3, Duration::from_millis(20));
        let started = std::time::Instant::now();
        let _: Result<(), String> = policy.execute(|| async { Err("x".to_string()) }).await;
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(40));
        assert!(elapsed < Duration::from_millis(1000));
    }

    #[test]
    fn defaults_match_linear_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.delay, Duration::from_secs(1));
    }
}
