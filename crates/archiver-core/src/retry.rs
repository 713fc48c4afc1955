//! Retry logic for history downloads.
//!
//! Gateway and radio links fail transiently. A sync run gets a bounded
//! number of attempts; between attempts it may wait according to the
//! configured delay strategy.
//!
//! # Example
//!
//! ```
//! use archiver_core::{RetryConfig, with_retry};
//!
//! let config = RetryConfig::immediate(3);
//! let mut calls = 0;
//! let result = with_retry(&config, "read_sensor", |_attempt| {
//!     calls += 1;
//!     if calls < 2 { Err("busy") } else { Ok(42) }
//! });
//! assert_eq!(result.unwrap(), 42);
//! assert_eq!(calls, 2);
//! ```

use std::fmt::Display;
use std::thread::sleep;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total number of attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay before the second attempt. Zero retries immediately.
    pub initial_delay: Duration,
    /// Maximum delay between attempts (for exponential backoff).
    pub max_delay: Duration,
    /// Backoff multiplier (1.0 = constant delay, 2.0 = double each time).
    pub backoff_multiplier: f64,
    /// Whether to add jitter to delays.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::ZERO,
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }
}

impl RetryConfig {
    /// Up to `max_attempts` attempts with the default (immediate) delays.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// Up to `max_attempts` attempts with no wait in between.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::ZERO,
            jitter: false,
            ..Default::default()
        }
    }

    /// Exponential backoff with jitter, suited to a flaky radio link.
    pub fn backoff(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }

    /// Set the total number of attempts.
    #[must_use]
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set initial delay.
    #[must_use]
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set maximum delay.
    #[must_use]
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set backoff multiplier.
    #[must_use]
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Enable or disable jitter.
    #[must_use]
    pub fn jitter(mut self, enabled: bool) -> Self {
        self.jitter = enabled;
        self
    }

    /// Attempts actually made, with zero promoted to one.
    pub fn effective_attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay to wait after the failed attempt number `failed` (1-based).
    pub fn delay_after(&self, failed: u32) -> Duration {
        if self.initial_delay.is_zero() {
            return Duration::ZERO;
        }

        let exponent = failed.saturating_sub(1).min(i32::MAX as u32) as i32;
        let base_delay = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        let capped_delay = base_delay.min(self.max_delay.as_secs_f64());

        let final_delay = if self.jitter {
            // Up to 25% extra
            let jitter_factor = 1.0 + (rand::rng().random::<f64>() * 0.25);
            capped_delay * jitter_factor
        } else {
            capped_delay
        };

        Duration::from_secs_f64(final_delay)
    }
}

/// All attempts failed.
#[derive(Debug)]
pub struct Exhausted<E> {
    /// How many attempts were made.
    pub attempts: u32,
    /// The error from the final attempt.
    pub last_error: E,
}

/// Run `operation` until it succeeds or the attempts run out.
///
/// The closure receives the 1-based attempt number. Every failure is
/// logged at warn level.
pub fn with_retry<T, E, F>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, Exhausted<E>>
where
    E: Display,
    F: FnMut(u32) -> Result<T, E>,
{
    let attempts = config.effective_attempts();
    let mut attempt = 1;

    loop {
        match operation(attempt) {
            Ok(result) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}", operation_name, attempt);
                }
                return Ok(result);
            }
            Err(e) => {
                if attempt >= attempts {
                    warn!(
                        "{} failed (attempt {}/{}): {}",
                        operation_name, attempt, attempts, e
                    );
                    return Err(Exhausted {
                        attempts: attempt,
                        last_error: e,
                    });
                }

                let delay = config.delay_after(attempt);
                warn!(
                    "{} failed (attempt {}/{}), retrying in {:?}: {}",
                    operation_name, attempt, attempts, delay, e
                );
                if !delay.is_zero() {
                    sleep(delay);
                }
                attempt += 1;
            }
        }
    }
}
