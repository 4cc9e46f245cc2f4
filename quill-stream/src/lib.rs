#![deny(missing_docs)]
//! Incremental decoding of quill generation streams.
//!
//! The response body arrives as arbitrary byte chunks. Each chunk goes
//! through a stateful [`Utf8Decoder`] so multi-byte characters split across
//! chunk seams are reassembled, then through a [`FrameReader`] that splits
//! the text into lines and parses `data: ` frames:
//!
//! ```text
//! data: {"text":"Once","done":false}
//! data: {"text":" upon","done":false}
//! data: [DONE]
//! ```
//!
//! [`frame_stream`] wraps a raw [`quill_types::ByteStream`] into a stream of
//! parsed [`Frame`]s that ends at the `[DONE]` sentinel without reading
//! further.

pub mod decoder;
pub mod frame;
pub mod reader;

mod stream;

pub use decoder::Utf8Decoder;
pub use frame::{DATA_PREFIX, DONE_SENTINEL, Frame, parse_line};
pub use reader::FrameReader;
pub use stream::frame_stream;
