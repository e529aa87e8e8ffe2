//! Error type shared by every backend call.

use thiserror::Error;

/// Errors that can occur while talking to the assistant backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("backend request timed out")]
    Timeout,

    /// The backend answered with a non-success status.
    #[error("backend returned HTTP {0}")]
    Status(u16),

    /// The response body was not the expected JSON.
    #[error("failed to parse backend response: {0}")]
    Parse(String),
}

impl BackendError {
    /// `true` for failures where the backend was never reached, or did not
    /// answer in time.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, BackendError::Request(_) | BackendError::Timeout)
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BackendError::Timeout
        } else if e.is_decode() {
            BackendError::Parse(e.to_string())
        } else {
            BackendError::Request(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connectivity_classification() {
        assert!(BackendError::Timeout.is_connectivity());
        assert!(BackendError::Request("refused".into()).is_connectivity());
        assert!(!BackendError::Status(500).is_connectivity());
        assert!(!BackendError::Parse("eof".into()).is_connectivity());
    }

    #[test]
    fn display_messages() {
        assert_eq!(BackendError::Status(503).to_string(), "backend returned HTTP 503");
        assert_eq!(BackendError::Timeout.to_string(), "backend request timed out");
    }
}
