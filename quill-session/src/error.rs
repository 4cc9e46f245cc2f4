//! Session error type.

use quill_types::TransportError;
use thiserror::Error;

/// Why a submission did not complete.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The stream was stopped by the user (or the session was dropped).
    #[error("request was aborted")]
    Cancelled,

    /// Opening or reading the stream failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl SessionError {
    /// Whether this is the cancellation signal rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SessionError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_is_distinguishable() {
        assert!(SessionError::Cancelled.is_cancelled());
        assert!(!SessionError::Transport(TransportError::Status(500)).is_cancelled());
    }

    #[test]
    fn display() {
        assert_eq!(SessionError::Cancelled.to_string(), "request was aborted");
        assert_eq!(
            SessionError::from(TransportError::Status(500)).to_string(),
            "HTTP error! status: 500"
        );
    }
}
