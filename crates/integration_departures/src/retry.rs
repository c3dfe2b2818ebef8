//! Bounded retry loop
//!
//! An operation is attempted once plus up to `max_retries` more times. Each
//! pass through the loop is one [`RetryState`] transition:
//!
//! ```text
//! Attempting(n) --ok--------------------------> Succeeded
//! Attempting(n) --retryable err, n <= max-----> Attempting(n + 1)
//! Attempting(n) --otherwise-------------------> Failed(err)
//! ```
//!
//! A failed operation yields the error of its last attempt unchanged.

use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{debug, warn};

use crate::error::ApiError;

/// Errors that can be checked for retryability
pub trait Retryable {
    /// Returns true if repeating the operation may succeed
    fn is_retryable(&self) -> bool;
}

impl Retryable for ApiError {
    fn is_retryable(&self) -> bool {
        Self::is_retryable(self)
    }
}

/// How often and how fast to retry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: u32,
    /// Pause between attempts
    pub delay: Duration,
    /// Random spread applied to `delay` (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::immediate(0)
    }
}

impl RetryPolicy {
    /// Retry without pausing
    #[must_use]
    pub const fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            delay: Duration::ZERO,
            jitter_factor: 0.0,
        }
    }

    /// Pause `delay` between attempts
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Spread delays by up to `factor` in either direction
    #[must_use]
    pub fn with_jitter(mut self, factor: f64) -> Self {
        self.jitter_factor = factor.clamp(0.0, 1.0);
        self
    }

    /// Total number of attempts this policy allows
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Pause before the next attempt
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn pause(&self) -> Duration {
        if self.delay.is_zero() || self.jitter_factor <= 0.0 {
            return self.delay;
        }
        let base = self.delay.as_secs_f64();
        let spread = base * self.jitter_factor;
        let jitter = rand::rng().random_range(-spread..=spread);
        Duration::from_secs_f64((base + jitter).max(0.0))
    }
}

/// Position of a retry loop
#[derive(Debug)]
pub enum RetryState<T, E> {
    /// About to make attempt `n` (1-based)
    Attempting(u32),
    /// An attempt returned a value
    Succeeded {
        /// The value
        value: T,
        /// Attempts made
        attempts: u32,
    },
    /// Attempts are exhausted or the error is not retryable
    Failed {
        /// Error of the last attempt
        error: E,
        /// Attempts made
        attempts: u32,
    },
}

/// Result of a retry loop together with how it got there
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    /// The result of the operation
    pub result: Result<T, E>,
    /// Number of attempts made (1 = no retries)
    pub attempts: u32,
    /// Total time spent including pauses
    pub total_duration: Duration,
}

impl<T, E> RetryOutcome<T, E> {
    /// Convert to standard Result, discarding metadata
    pub fn into_result(self) -> Result<T, E> {
        self.result
    }
}

/// Run `operation` under `policy`
///
/// The operation receives the 1-based attempt number.
#[allow(clippy::cast_possible_truncation)]
pub async fn with_retry<F, Fut, T, E>(policy: &RetryPolicy, mut operation: F) -> RetryOutcome<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let start = Instant::now();
    let mut state = RetryState::Attempting(1);

    loop {
        state = match state {
            RetryState::Attempting(attempt) => match operation(attempt).await {
                Ok(value) => RetryState::Succeeded {
                    value,
                    attempts: attempt,
                },
                Err(error) if !error.is_retryable() => {
                    debug!(attempt, error = %error, "Request failed with non-retryable error");
                    RetryState::Failed {
                        error,
                        attempts: attempt,
                    }
                },
                Err(error) if attempt >= policy.max_attempts() => {
                    warn!(
                        attempts = attempt,
                        max_retries = policy.max_retries,
                        error = %error,
                        "Request failed after max retries"
                    );
                    RetryState::Failed {
                        error,
                        attempts: attempt,
                    }
                },
                Err(error) => {
                    let pause = policy.pause();
                    debug!(
                        attempt,
                        max_retries = policy.max_retries,
                        delay_ms = pause.as_millis() as u64,
                        error = %error,
                        "Retrying request"
                    );
                    if !pause.is_zero() {
                        tokio::time::sleep(pause).await;
                    }
                    RetryState::Attempting(attempt + 1)
                },
            },
            RetryState::Succeeded { value, attempts } => {
                if attempts > 1 {
                    debug!(attempts, "Request succeeded after retries");
                }
                return RetryOutcome {
                    result: Ok(value),
                    attempts,
                    total_duration: start.elapsed(),
                };
            },
            RetryState::Failed { error, attempts } => {
                return RetryOutcome {
                    result: Err(error),
                    attempts,
                    total_duration: start.elapsed(),
                };
            },
        };
    }
}
