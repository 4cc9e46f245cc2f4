//! Adapter from a raw response body to a stream of frames.

use futures::{Stream, StreamExt};
use quill_types::{ByteStream, TransportError};

use crate::frame::Frame;
use crate::reader::FrameReader;

/// Wrap a response body into a stream of parsed [`Frame`]s.
///
/// Chunks are pulled lazily: the next read is only issued once every frame
/// of the previous chunk has been consumed. The stream ends after yielding
/// [`Frame::Done`] (no further reads), after a read error, or when the body
/// is exhausted.
pub fn frame_stream(
    mut body: ByteStream,
) -> impl Stream<Item = Result<Frame, TransportError>> + Send + 'static {
    async_stream::stream! {
        let mut reader = FrameReader::new();

        while let Some(chunk_result) = body.next().await {
            let chunk = match chunk_result {
                Ok(b) => b,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            tracing::trace!(bytes = chunk.len(), "read chunk");

            for frame in reader.push(&chunk) {
                yield Ok(frame);
            }
            if reader.is_done() {
                return;
            }
        }

        for frame in reader.finish() {
            yield Ok(frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counted_body(chunks: &[&'static str], reads: Arc<AtomicUsize>) -> ByteStream {
        let items: Vec<Result<Bytes, TransportError>> = chunks
            .iter()
            .map(|c| Ok(Bytes::from_static(c.as_bytes())))
            .collect();
        Box::pin(futures::stream::iter(items).inspect(move |_| {
            reads.fetch_add(1, Ordering::SeqCst);
        }))
    }

    #[tokio::test]
    async fn stops_reading_after_sentinel() {
        let reads = Arc::new(AtomicUsize::new(0));
        let body = counted_body(
            &[
                r#"data: {"text":"Once"}"#,
                r#"data: {"text":" upon"}"#,
                "data: [DONE]",
                r#"data: {"text":" never"}"#,
            ],
            reads.clone(),
        );
        let frames: Vec<_> = frame_stream(body).collect().await;
        assert_eq!(frames.len(), 3);
        assert_eq!(frames.last(), Some(&Ok(Frame::Done)));
        assert_eq!(reads.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhaustion_without_sentinel_ends_cleanly() {
        let reads = Arc::new(AtomicUsize::new(0));
        let body = counted_body(&["data: {\"text\":\"a\"}\n", "data: {\"text\":\"b"], reads);
        let frames: Vec<_> = frame_stream(body).collect().await;
        // The truncated trailing frame cannot parse and surfaces as malformed.
        assert_eq!(frames.len(), 2);
        assert!(matches!(&frames[1], Ok(Frame::Malformed(_))));
    }

    #[tokio::test]
    async fn read_error_ends_stream() {
        let items: Vec<Result<Bytes, TransportError>> = vec![
            Ok(Bytes::from_static(b"data: {\"text\":\"a\"}\n")),
            Err(TransportError::Read("connection reset".into())),
            Ok(Bytes::from_static(b"data: {\"text\":\"b\"}\n")),
        ];
        let frames: Vec<_> = frame_stream(Box::pin(futures::stream::iter(items)))
            .collect()
            .await;
        assert_eq!(frames.len(), 2);
        assert_eq!(
            frames[1],
            Err(TransportError::Read("connection reset".into()))
        );
    }
}
