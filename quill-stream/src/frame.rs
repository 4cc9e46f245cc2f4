//! Parsing of individual `data: ` frame lines.

use quill_types::PoemChunk;

/// Prefix marking a data frame.
pub const DATA_PREFIX: &str = "data: ";

/// Payload that terminates the stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// One parsed data frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A well-formed record.
    Chunk(PoemChunk),
    /// The `[DONE]` sentinel. Nothing after it is read.
    Done,
    /// A data frame whose payload is not a record (e.g. a keepalive).
    /// Carries the raw payload.
    Malformed(String),
}

impl Frame {
    /// Whether this frame fully parsed (a record or the sentinel).
    pub fn is_complete(&self) -> bool {
        !matches!(self, Frame::Malformed(_))
    }
}

/// Parse one line of the response body.
///
/// Returns `None` for lines that are not data frames (blank separators,
/// `event:` or comment lines). A trailing `\r` is ignored.
pub fn parse_line(line: &str) -> Option<Frame> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let payload = line.strip_prefix(DATA_PREFIX)?;
    if payload == DONE_SENTINEL {
        return Some(Frame::Done);
    }
    Some(match serde_json::from_str::<PoemChunk>(payload) {
        Ok(chunk) => Frame::Chunk(chunk),
        Err(_) => Frame::Malformed(payload.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str) -> Frame {
        Frame::Chunk(PoemChunk {
            text: Some(text.into()),
            ..Default::default()
        })
    }

    #[test]
    fn data_line_with_text() {
        assert_eq!(parse_line(r#"data: {"text":"Once"}"#), Some(chunk("Once")));
    }

    #[test]
    fn sentinel() {
        assert_eq!(parse_line("data: [DONE]"), Some(Frame::Done));
        assert_eq!(parse_line("data: [DONE]\r"), Some(Frame::Done));
    }

    #[test]
    fn sentinel_must_match_exactly() {
        assert_eq!(
            parse_line("data: [DONE] "),
            Some(Frame::Malformed("[DONE] ".into()))
        );
    }

    #[test]
    fn malformed_payload() {
        let frame = parse_line("data: not-json").unwrap();
        assert_eq!(frame, Frame::Malformed("not-json".into()));
        assert!(!frame.is_complete());
    }

    #[test]
    fn non_data_lines_ignored() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line(": keepalive"), None);
        assert_eq!(parse_line("event: message"), None);
        assert_eq!(parse_line(r#"data:{"text":"no space"}"#), None);
    }

    #[test]
    fn server_done_record_is_a_chunk() {
        let frame = parse_line(r#"data: {"text":"","done":true,"error":null}"#).unwrap();
        assert!(frame.is_complete());
        assert!(matches!(frame, Frame::Chunk(c) if c.done && c.fragment().is_none()));
    }
}
