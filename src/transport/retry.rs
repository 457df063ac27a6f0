//! Bounded retry with backoff.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::Error;

/// Delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Retry immediately.
    None,
    /// The same delay before every retry.
    Fixed(Duration),
    /// Doubling delay, starting at `initial` and capped at `max`.
    Exponential {
        /// Delay before the first retry.
        initial: Duration,
        /// Upper bound for any single delay.
        max: Duration,
    },
}

impl Backoff {
    /// Delay after the `failures`-th failed attempt (1-based).
    pub fn delay(&self, failures: u32) -> Duration {
        match *self {
            Self::None => Duration::ZERO,
            Self::Fixed(delay) => delay,
            Self::Exponential { initial, max } => {
                let factor = 1u32.checked_shl(failures.saturating_sub(1)).unwrap_or(u32::MAX);
                initial.saturating_mul(factor).min(max)
            }
        }
    }
}

/// How many times to try an operation and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Wait between attempts.
    pub backoff: Backoff,
}

/// The error returned when every attempt failed.
#[derive(Debug)]
pub struct Exhausted {
    /// Attempts made.
    pub attempts: u32,
    /// The error from the last attempt.
    pub error: Error,
}

impl RetryPolicy {
    /// Policy for a single characteristic write: 3 attempts, 200 ms apart.
    pub const CHUNK_WRITE: Self = Self {
        max_attempts: 3,
        backoff: Backoff::Fixed(Duration::from_millis(200)),
    };

    /// Try exactly once.
    pub const fn once() -> Self {
        Self {
            max_attempts: 1,
            backoff: Backoff::None,
        }
    }

    /// Create a policy.
    pub const fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    /// Run `op` until it succeeds or the attempt budget is spent.
    ///
    /// `op` receives the 1-based attempt number. Sleeps use the tokio clock,
    /// so paused-time tests observe the exact backoff.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, Exhausted>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = crate::error::Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("{} succeeded on attempt {}", operation, attempt);
                    }
                    return Ok(value);
                }
                Err(error) if attempt >= max_attempts => {
                    return Err(Exhausted {
                        attempts: attempt,
                        error,
                    });
                }
                Err(error) => {
                    let delay = self.backoff.delay(attempt);
                    warn!(
                        "{} attempt {} of {} failed: {}; retrying in {:?}",
                        operation, attempt, max_attempts, error, delay
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::CHUNK_WRITE
    }
}
