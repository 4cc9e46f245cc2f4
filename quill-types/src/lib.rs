#![deny(missing_docs)]
//! Core types for quill.
//!
//! Provides the [`Transport`] trait for opening streaming generation
//! requests, the [`GenerateRequest`] body and its [`GenerationParams`],
//! and the [`PoemChunk`] record carried by each data frame of the response.

pub mod record;
pub mod request;
pub mod transport;

// Re-exports
pub use record::{ActiveStreams, HealthStatus, PoemChunk};
pub use request::{
    DEFAULT_MAX_LENGTH, DEFAULT_TEMPERATURE, GenerateRequest, GenerationParams, InvalidParams,
};
pub use transport::{ByteStream, GENERATE_PATH, ResponseStream, Transport, TransportError};

#[cfg(feature = "test-utils")]
pub mod test_utils;
