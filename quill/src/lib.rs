#![deny(missing_docs)]
//! # quill: umbrella crate
//!
//! Provides a single import surface for quill: the core types, the frame
//! decoder, the session controller, and the HTTP transport, behind feature
//! flags, plus a `prelude` for the happy path.
//!
//! ```no_run
//! use quill::prelude::*;
//!
//! # async fn run() {
//! let session = Session::new(HttpTransport::from_env());
//! session.set_draft("Shall I compare thee to a summer's day?");
//! match session.submit().await {
//!     Outcome::Completed(_) => println!("{}", session.output()),
//!     other => eprintln!("{other:?}"),
//! }
//! # }
//! ```

pub use quill_types;
#[cfg(feature = "http")]
pub use quill_http;
#[cfg(feature = "session")]
pub use quill_session;
#[cfg(feature = "stream")]
pub use quill_stream;

/// Happy-path imports for driving a generation session.
pub mod prelude {
    pub use quill_types::{
        GenerateRequest, GenerationParams, PoemChunk, ResponseStream, Transport, TransportError,
    };

    #[cfg(feature = "stream")]
    pub use quill_stream::{Frame, FrameReader, Utf8Decoder, frame_stream};

    #[cfg(feature = "session")]
    pub use quill_session::{
        Completion, FAILURE_MESSAGE, Outcome, Phase, Rejection, Session, SessionError,
        SessionWatcher, Snapshot,
    };

    #[cfg(feature = "http")]
    pub use quill_http::HttpTransport;
}
