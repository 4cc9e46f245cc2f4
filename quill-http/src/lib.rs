#![deny(missing_docs)]
//! HTTP transport for quill.
//!
//! Implements [`quill_types::Transport`] over `reqwest`: a `POST` to
//! `/api/generate-poem` whose body is handed back as a lazily-read byte
//! stream. Also exposes the auxiliary endpoints of the generation service
//! (synchronous generation, health, stream listing, remote cancellation).

mod client;
mod error;

pub use client::{API_URL_ENV, DEFAULT_BASE_URL, HttpTransport, STREAM_ID_HEADER};
