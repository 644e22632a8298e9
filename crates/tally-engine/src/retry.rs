//! # Contention Retry
//!
//! Every write runs as one transaction. When SQLite reports the database
//! busy, or a guarded update finds that another writer got there first, the
//! whole transaction is rolled back and run again from the top, after an
//! exponential delay.
//!
//! ```text
//! attempt 1 ──► Contention ──► sleep ~initial ──► attempt 2 ──► Contention
//!                                                                  │
//!          Err(Contention) ◄── attempts used up ◄── attempt 3 ◄────┘
//! ```
//!
//! Any other error ends the loop at once.

use std::future::Future;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use tracing::warn;

use crate::error::EngineResult;

/// How many times an operation is attempted and how long to wait between
/// attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::new(3, Duration::from_millis(25))
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        RetryPolicy {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff: initial_backoff * 8,
        }
    }

    /// A single attempt, no retries.
    pub fn no_retry() -> Self {
        RetryPolicy::new(1, Duration::ZERO)
    }

    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.initial_backoff,
            max_interval: self.max_backoff,
            multiplier: 2.0,
            max_elapsed_time: None, // bounded by max_attempts instead
            ..Default::default()
        }
    }

    /// Runs `attempt` until it succeeds, fails with a non-retryable error,
    /// or the attempts are used up.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut attempt: F) -> EngineResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = EngineResult<T>>,
    {
        let mut backoff = self.create_backoff();
        // current_interval starts at the crate default until reset
        backoff.reset();
        let mut tried = 0;

        loop {
            tried += 1;
            match attempt().await {
                Err(err) if err.is_retryable() && tried < self.max_attempts => {
                    let delay = backoff.next_backoff().unwrap_or(self.max_backoff);
                    warn!(
                        operation,
                        attempt = tried,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Contention, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) if err.is_retryable() => {
                    warn!(operation, attempts = tried, error = %err, "Contention, giving up");
                    return Err(err);
                }
                other => return other,
            }
        }
    }
}
