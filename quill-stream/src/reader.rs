//! Chunk-to-frame reassembly.
//!
//! Each read is decoded and split into lines. The end of a read counts as a
//! line boundary for frames that already parse, so a frame delivered as its
//! own read (with or without a trailing newline) is handled immediately.
//! A trailing line that does not parse yet is carried to the next read:
//!
//! - if the next read starts a new `data: ` line, the carried line is
//!   processed on its own;
//! - otherwise the next read continues it.
//!
//! Whatever is still carried at end of stream is processed as is.
//!
//! The first rule is lenient: a JSON string that happens to continue with
//! `data: ` right at a read boundary is split into two malformed lines, and
//! that fragment is lost.

use crate::decoder::Utf8Decoder;
use crate::frame::{DATA_PREFIX, Frame, parse_line};

/// Turns raw byte chunks into parsed [`Frame`]s.
#[derive(Debug, Default)]
pub struct FrameReader {
    decoder: Utf8Decoder,
    /// Unterminated trailing line that did not parse as a frame.
    carry: String,
    /// Set once the `[DONE]` sentinel has been returned.
    done: bool,
}

impl FrameReader {
    /// Create a reader with empty buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the `[DONE]` sentinel has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed one chunk of bytes; returns the frames it completes, in order.
    ///
    /// Frames after a `[DONE]` sentinel are discarded, and once it has been
    /// returned every later call returns nothing.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Frame> {
        let mut frames = Vec::new();
        if self.done {
            return frames;
        }

        let decoded = self.decoder.decode(chunk);
        let text = if self.carry.is_empty() {
            decoded
        } else if decoded.starts_with(DATA_PREFIX) {
            let carried = std::mem::take(&mut self.carry);
            if self.emit(&carried, &mut frames) {
                return frames;
            }
            decoded
        } else {
            let mut joined = std::mem::take(&mut self.carry);
            joined.push_str(&decoded);
            joined
        };

        let mut lines = text.split('\n').peekable();
        while let Some(line) = lines.next() {
            if lines.peek().is_none() {
                // Unterminated tail of this read.
                if line.is_empty() {
                    break;
                }
                match parse_line(line) {
                    Some(frame) if frame.is_complete() => {
                        self.accept(frame, &mut frames);
                    }
                    _ => self.carry = line.to_string(),
                }
                break;
            }
            if self.emit(line, &mut frames) {
                return frames;
            }
        }
        frames
    }

    /// Flush at end of stream: decodes any buffered bytes and processes the
    /// carried line.
    pub fn finish(&mut self) -> Vec<Frame> {
        let mut frames = Vec::new();
        if self.done {
            return frames;
        }
        let mut text = std::mem::take(&mut self.carry);
        text.push_str(&self.decoder.finish());
        for line in text.split('\n') {
            if self.emit(line, &mut frames) {
                break;
            }
        }
        frames
    }

    /// Parse `line` and collect its frame. Returns `true` once the sentinel
    /// has been reached.
    fn emit(&mut self, line: &str, frames: &mut Vec<Frame>) -> bool {
        if let Some(frame) = parse_line(line) {
            self.accept(frame, frames);
        }
        self.done
    }

    fn accept(&mut self, frame: Frame, frames: &mut Vec<Frame>) {
        if frame == Frame::Done {
            self.done = true;
        }
        frames.push(frame);
    }
}
