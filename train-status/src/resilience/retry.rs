//! Failure classification for retries.

/// Whether a failed call is worth repeating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    /// Transient: network failure, rate limiting, server error.
    Retryable,
    /// Repeating the same request cannot succeed.
    Fatal,
}

impl RetryClass {
    /// Classify by HTTP status.
    ///
    /// `None` means no response was received at all, which is retryable.
    /// 429 and 5xx are retryable; every other status (notably 400, 401,
    /// 403, 404) is not.
    pub fn from_status(status: Option<u16>) -> Self {
        match status {
            None | Some(429) | Some(500..=599) => RetryClass::Retryable,
            Some(_) => RetryClass::Fatal,
        }
    }
}

/// Errors that know how they should be retried.
pub trait Retryable {
    fn retry_class(&self) -> RetryClass;
}
