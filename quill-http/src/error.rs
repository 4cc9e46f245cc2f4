//! Internal error helpers for mapping HTTP/reqwest errors to [`TransportError`].

use quill_types::TransportError;

/// Turn a non-success status into [`TransportError::Status`].
///
/// Only the status is inspected; the body is never read.
pub(crate) fn check_status(status: reqwest::StatusCode) -> Result<(), TransportError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(TransportError::Status(status.as_u16()))
    }
}

/// Map a [`reqwest::Error`] raised while sending a request.
pub(crate) fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_decode() {
        TransportError::InvalidResponse(err.to_string())
    } else {
        TransportError::Network(err.to_string())
    }
}

/// Map a [`reqwest::Error`] raised while reading a streamed body.
pub(crate) fn map_read_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Read(err.to_string())
    }
}
