//! Stateful incremental UTF-8 decoder.

/// Replacement emitted for invalid or truncated byte sequences.
const REPLACEMENT: char = '\u{FFFD}';

/// Decodes a byte stream chunk by chunk without corrupting characters that
/// straddle a chunk boundary.
///
/// An incomplete sequence at the end of a chunk is held back until the next
/// chunk completes it. Invalid sequences decode to U+FFFD; decoding never
/// fails.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    /// Leading bytes of a multi-byte sequence cut off by the last chunk.
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Create a decoder with no buffered bytes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, holding back any trailing partial sequence.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut input = std::mem::take(&mut self.pending);
        input.extend_from_slice(chunk);

        let mut out = String::with_capacity(input.len());
        let mut rest = input.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(s) => {
                    out.push_str(s);
                    break;
                }
                Err(e) => {
                    let (valid, tail) = rest.split_at(e.valid_up_to());
                    if let Ok(s) = std::str::from_utf8(valid) {
                        out.push_str(s);
                    }
                    match e.error_len() {
                        Some(len) => {
                            out.push(REPLACEMENT);
                            rest = &tail[len..];
                        }
                        // Truncated sequence at the end: wait for more bytes.
                        None => {
                            self.pending = tail.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Flush the decoder at end of stream.
    ///
    /// A sequence still incomplete at this point can never be completed and
    /// decodes to a single U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            REPLACEMENT.to_string()
        }
    }

    /// Whether bytes of an incomplete sequence are buffered.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
