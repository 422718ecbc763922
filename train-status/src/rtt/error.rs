//! Timetable client error types.

use crate::resilience::{RetryClass, Retryable};

/// Errors from the timetable HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum RttError {
    /// The request never produced a response (connect failure, timeout, reset).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status code.
    #[error("API error {status}: {message}")]
    Http { status: u16, message: String },

    /// The response body was not the expected JSON.
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// Credentials could not be turned into an authorization header.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Canned timetable data could not be loaded.
    #[error("mock data error: {0}")]
    MockData(String),
}

impl RttError {
    /// HTTP status code, if the API responded at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            RttError::Http { status, .. } => Some(*status),
            RttError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl Retryable for RttError {
    fn retry_class(&self) -> RetryClass {
        match self {
            RttError::Transport(_) | RttError::Http { .. } => RetryClass::from_status(self.status()),
            RttError::Json { .. } | RttError::InvalidCredentials(_) | RttError::MockData(_) => {
                RetryClass::Fatal
            }
        }
    }
}
