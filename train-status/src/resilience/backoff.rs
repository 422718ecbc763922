//! Exponential backoff with bounded jitter.
//!
//! The delay for zero-indexed attempt `a` is
//! `min(base × 2^a × (1 + jitter), max)` with `jitter` drawn from
//! `[0, 0.3)`. The computation itself is pure: randomness comes from a
//! [`JitterSource`], so tests inject [`FixedJitter`].
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use train_status::resilience::{BackoffPolicy, FixedJitter};
//!
//! let backoff = BackoffPolicy::new(Duration::from_millis(1000), Duration::from_millis(10_000));
//!
//! assert_eq!(backoff.delay(0, &FixedJitter(0.0)), Duration::from_millis(1000));
//! assert_eq!(backoff.delay(2, &FixedJitter(0.25)), Duration::from_millis(5000));
//!
//! // 1000ms × 2^4 = 16s → capped
//! assert_eq!(backoff.delay(4, &FixedJitter(0.0)), Duration::from_millis(10_000));
//! ```

use std::time::Duration;

use rand::Rng;

/// Upper bound (exclusive) of the jitter fraction.
pub const MAX_JITTER: f64 = 0.3;

/// Supplies the jitter fraction for one backoff computation.
pub trait JitterSource: Send + Sync {
    /// Returns a value in `[0, MAX_JITTER)`.
    fn sample(&self) -> f64;
}

/// Uniformly random jitter from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomJitter;

impl JitterSource for RandomJitter {
    fn sample(&self) -> f64 {
        rand::rng().random_range(0.0..MAX_JITTER)
    }
}

/// Constant jitter, for deterministic tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedJitter(pub f64);

impl JitterSource for FixedJitter {
    fn sample(&self) -> f64 {
        self.0
    }
}

/// Retry delay policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    /// Delay before the first retry, before jitter.
    pub base: Duration,
    /// Cap applied after jitter.
    pub max: Duration,
}

impl Default for BackoffPolicy {
    /// 1s base, 10s cap.
    fn default() -> Self {
        Self {
            base: Duration::from_millis(1000),
            max: Duration::from_millis(10_000),
        }
    }
}

impl BackoffPolicy {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }

    /// Computes the delay for `attempt` using a jitter drawn from `jitter`.
    pub fn delay(&self, attempt: u32, jitter: &dyn JitterSource) -> Duration {
        self.delay_with(attempt, jitter.sample())
    }

    /// Computes the delay for `attempt` with an explicit jitter fraction.
    ///
    /// The fraction is clamped into `[0, MAX_JITTER]`; non-finite values
    /// count as zero. Overflowing exponents saturate at `max`.
    pub fn delay_with(&self, attempt: u32, jitter: f64) -> Duration {
        let jitter = if jitter.is_finite() {
            jitter.clamp(0.0, MAX_JITTER)
        } else {
            0.0
        };

        let exp = attempt.min(i32::MAX as u32) as i32;
        let secs = self.base.as_secs_f64() * 2f64.powi(exp) * (1.0 + jitter);

        if !secs.is_finite() || secs >= self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        }
    }
}
