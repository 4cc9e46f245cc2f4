//! Transport trait for streaming generation backends.
//!
//! The [`Transport`] trait uses RPITIT (return-position `impl Trait` in
//! traits) and is NOT object-safe. The session controller is generic over
//! it, so tests can swap in a scripted in-memory transport.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;
use thiserror::Error;

use crate::request::GenerateRequest;

/// Path of the streaming generation endpoint.
pub const GENERATE_PATH: &str = "/api/generate-poem";

/// Errors from opening or reading a generation stream.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The service answered with a non-success status. The body is not read.
    #[error("HTTP error! status: {0}")]
    Status(u16),

    /// Connecting or sending the request failed.
    #[error("network error: {0}")]
    Network(String),

    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// Reading the response body failed mid-stream.
    #[error("stream read error: {0}")]
    Read(String),

    /// A non-streaming response could not be parsed.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// The raw response body: chunks of bytes in arrival order.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// A successfully opened generation stream.
pub struct ResponseStream {
    /// Server-assigned stream id (`X-Stream-ID`), when the server sends one.
    pub stream_id: Option<String>,
    /// The response body. Nothing is read until it is polled.
    pub body: ByteStream,
}

impl ResponseStream {
    /// Wrap a body with no stream id.
    pub fn new(body: ByteStream) -> Self {
        Self {
            stream_id: None,
            body,
        }
    }

    /// Attach a server-assigned stream id.
    pub fn with_stream_id(mut self, id: impl Into<String>) -> Self {
        self.stream_id = Some(id.into());
        self
    }
}

impl fmt::Debug for ResponseStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseStream")
            .field("stream_id", &self.stream_id)
            .finish_non_exhaustive()
    }
}

/// A backend that can open a streaming generation request.
///
/// Implementations issue exactly one request per call. A non-success
/// status resolves to [`TransportError::Status`] without touching the body.
/// Dropping the returned future (or the body stream) abandons the request.
pub trait Transport: Send + Sync {
    /// Open a streaming generation request.
    fn open(
        &self,
        request: &GenerateRequest,
    ) -> impl Future<Output = Result<ResponseStream, TransportError>> + Send;
}
