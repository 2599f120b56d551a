//! Retry policy for mileage sink writes.
//!
//! A failed append is retried with exponential backoff until the attempt
//! budget is exhausted, at which point the record is reported as unsaved.
//!
//! # Example
//!
//! ```ignore
//! use roadledger::tracking::RetryPolicy;
//!
//! // Five attempts: 200ms, 400ms, 800ms, 1.6s between them
//! let policy = RetryPolicy::exponential(5);
//! assert_eq!(policy.delay_for_attempt(1), Some(Duration::from_millis(200)));
//! ```

use std::time::Duration;

/// Default initial delay for exponential backoff (200ms).
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 200;

/// Default maximum delay for exponential backoff (30 seconds).
pub const DEFAULT_MAX_DELAY_SECS: u64 = 30;

/// Default multiplier for exponential backoff.
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Default attempt budget per record (including the first attempt).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// How a sink write handles transient failures.
#[derive(Clone, Debug, PartialEq)]
pub enum RetryPolicy {
    /// No retries - report the record unsaved after the first failure.
    None,

    /// Exponential backoff.
    ///
    /// The delay is multiplied after each failed attempt, up to `max_delay`.
    ExponentialBackoff {
        /// Maximum number of attempts (including the initial attempt).
        max_attempts: u32,
        /// Delay after the first failure.
        initial_delay: Duration,
        /// Delay cap.
        max_delay: Duration,
        /// Multiplier applied after each failure (typically 2.0).
        multiplier: f64,
    },
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential(DEFAULT_MAX_ATTEMPTS)
    }
}

impl RetryPolicy {
    /// Exponential backoff with the default delays.
    ///
    /// # Arguments
    ///
    /// * `max_attempts` - Maximum number of attempts (including initial)
    pub fn exponential(max_attempts: u32) -> Self {
        Self::ExponentialBackoff {
            max_attempts,
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            max_delay: Duration::from_secs(DEFAULT_MAX_DELAY_SECS),
            multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }

    /// Exponential backoff with explicit delays.
    pub fn exponential_with(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self::ExponentialBackoff {
            max_attempts,
            initial_delay,
            max_delay,
            multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }

    /// Delay before retry number `attempt` (1-based, 1 is the first retry).
    ///
    /// Returns `None` once the attempt budget is exhausted.
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        match self {
            Self::None => None,
            Self::ExponentialBackoff {
                max_attempts,
                initial_delay,
                max_delay,
                multiplier,
            } => {
                if attempt == 0 || attempt >= *max_attempts {
                    return None;
                }
                let factor = multiplier.powi((attempt - 1) as i32);
                let delay_ms = initial_delay.as_millis() as f64 * factor;
                let capped = delay_ms.min(max_delay.as_millis() as f64);
                Some(Duration::from_millis(capped as u64))
            }
        }
    }

    /// Maximum number of attempts for this policy.
    pub fn max_attempts(&self) -> u32 {
        match self {
            Self::None => 1,
            Self::ExponentialBackoff { max_attempts, .. } => *max_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_exponential() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), DEFAULT_MAX_ATTEMPTS);
    }

    #[test]
    fn test_none_never_retries() {
        assert_eq!(RetryPolicy::None.delay_for_attempt(1), None);
        assert_eq!(RetryPolicy::None.max_attempts(), 1);
    }

    #[test]
    fn test_exponential_delays_double() {
        let policy = RetryPolicy::exponential(5);
        assert_eq!(policy.delay_for_attempt(1), Some(Duration::from_millis(200)));
        assert_eq!(policy.delay_for_attempt(2), Some(Duration::from_millis(400)));
        assert_eq!(policy.delay_for_attempt(3), Some(Duration::from_millis(800)));
        assert_eq!(policy.delay_for_attempt(4), Some(Duration::from_millis(1600)));
        assert_eq!(policy.delay_for_attempt(5), None);
    }

    #[test]
    fn test_exponential_respects_cap() {
        let policy = RetryPolicy::exponential_with(
            20,
            Duration::from_secs(1),
            Duration::from_secs(5),
        );
        assert_eq!(policy.delay_for_attempt(10), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_attempt_zero_has_no_delay() {
        assert_eq!(RetryPolicy::exponential(3).delay_for_attempt(0), None);
    }
}
