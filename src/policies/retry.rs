//! # Retry policy for failed loads.
//!
//! [`RetryPolicy`] controls how many consecutive load failures a placement
//! tolerates and how long to wait before the next attempt.
//! It is parameterized by:
//! - [`RetryPolicy::max_attempts`] the cap on consecutive failures;
//! - [`RetryPolicy::first`] the delay after the first failure;
//! - [`RetryPolicy::factor`] the multiplicative growth factor;
//! - [`RetryPolicy::max`] the maximum delay cap.
//!
//! The delay after failure `n` (1-based) is `first × factor^(n-1)`, clamped to `max`.
//! With the default `factor = 1.0` the delay is a fixed 5 seconds.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use adkeeper::RetryPolicy;
//!
//! let retry = RetryPolicy::default();
//! assert_eq!(retry.delay_for(1), Duration::from_secs(5));
//! assert_eq!(retry.delay_for(2), Duration::from_secs(5));
//! assert!(retry.should_retry(2));
//! assert!(!retry.should_retry(3));
//! ```

use std::time::Duration;

/// Bounded retry policy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Consecutive failures after which automatic retries stop (min 1).
    pub max_attempts: u32,
    /// Delay before the retry that follows the first failure.
    pub first: Duration,
    /// Multiplicative growth factor (`1.0` = fixed delay).
    pub factor: f64,
    /// Maximum delay cap.
    pub max: Duration,
}

impl Default for RetryPolicy {
    /// Returns a policy with:
    /// - `max_attempts = 3`;
    /// - `first = max = 5s`;
    /// - `factor = 1.0` (fixed delay).
    fn default() -> Self {
        Self::fixed(3, Duration::from_secs(5))
    }
}

impl RetryPolicy {
    /// Fixed-delay policy: every retry waits `delay`.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            first: delay,
            factor: 1.0,
            max: delay,
        }
    }

    /// Returns `true` while another automatic attempt is allowed after `failures`
    /// consecutive failures.
    #[inline]
    pub fn should_retry(&self, failures: u32) -> bool {
        failures < self.max_attempts.max(1)
    }

    /// Computes the delay to wait after `failures` consecutive failures.
    ///
    /// `failures = 0` is treated as `1`. Non-finite or oversized results clamp to `max`.
    pub fn delay_for(&self, failures: u32) -> Duration {
        let exp = failures.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);
        let max_secs = self.max.as_secs_f64();

        if !secs.is_finite() || secs < 0.0 || secs > max_secs {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        }
    }
}
