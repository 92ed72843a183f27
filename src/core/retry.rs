//! Bounded retry with linear backoff
//!
//! Every failure is retried identically up to the cap; the delay before
//! attempt k is `k * backoff_unit`. No jitter, no error-type inspection.

use crate::error::{Result, YtBatchError};
use colored::Colorize;
use std::time::Duration;
use tokio::time::sleep;

/// Policy for retrying a fallible async operation
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_unit: Duration::from_millis(2000),
        }
    }
}

impl RetryPolicy {
    /// Run `op` up to `max_attempts` times. The closure receives the 1-based
    /// attempt number. After exhausting attempts, fail with the last cause.
    pub async fn run<T, F>(&self, mut op: F) -> Result<T>
    where
        F: AsyncFnMut(u32) -> Result<T>,
    {
        let mut last: Option<YtBatchError> = None;

        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                println!(
                    "{}",
                    format!("Retry attempt {}/{}...", attempt, self.max_attempts).yellow()
                );
                sleep(self.backoff_unit * attempt).await;
            }

            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => last = Some(e),
            }
        }

        Err(YtBatchError::RetriesExhausted {
            attempts: self.max_attempts,
            last: Box::new(
                last.unwrap_or_else(|| YtBatchError::Spawn("no attempts were made".into())),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn failing(counter: &AtomicU32) -> impl AsyncFnMut(u32) -> Result<()> {
        async move |_attempt| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(YtBatchError::Spawn("injected".into()))
        }
    }

    #[tokio::test]
    async fn succeeds_first_try_without_delay() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);
        let result = policy
            .run(async |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(42)
            })
            .await
            .unwrap();
        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_exactly_max_attempts() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);

        let err = policy.run(failing(&calls)).await.unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match err {
            YtBatchError::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(last.to_string().contains("injected"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_is_attempt_times_unit() {
        // Delay before attempt 2 is 2 * unit, before attempt 3 is 3 * unit:
        // total 10s of virtual time for three failing attempts.
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let _ = policy.run(failing(&calls)).await;

        assert_eq!(started.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn stops_retrying_after_success() {
        let policy = RetryPolicy {
            max_attempts: 3,
            backoff_unit: Duration::ZERO,
        };
        let calls = AtomicU32::new(0);

        let result = policy
            .run(async |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                if attempt < 2 {
                    Err(YtBatchError::Spawn("flaky".into()))
                } else {
                    Ok(attempt)
                }
            })
            .await
            .unwrap();

        assert_eq!(result, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
