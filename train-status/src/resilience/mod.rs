//! Fault-tolerant calling of upstream dependencies.
//!
//! A [`ResilientClient`] wraps any async operation with a
//! [`CircuitBreaker`] and bounded retries spaced by a [`BackoffPolicy`].
//! Failures are sorted into retryable and fatal via [`Retryable`].
//! [`ClientRegistry`] hands out one client per named dependency.

mod backoff;
mod breaker;
mod client;
mod registry;
mod retry;

pub use backoff::{BackoffPolicy, FixedJitter, JitterSource, MAX_JITTER, RandomJitter};
pub use breaker::{
    BreakerConfig, BreakerSnapshot, BreakerState, CircuitBreaker, CircuitOpen, Transition,
};
pub use client::{ResilientClient, ResilientError, RetryConfig};
pub use registry::ClientRegistry;
pub use retry::{RetryClass, Retryable};
