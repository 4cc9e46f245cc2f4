//! ScriptedTransport: replays canned chunks without a network.

use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use futures::StreamExt;

use crate::request::GenerateRequest;
use crate::transport::{ByteStream, ResponseStream, Transport, TransportError};

#[derive(Debug, Clone)]
enum Reply {
    Body {
        chunks: Vec<Result<Bytes, TransportError>>,
        hang: bool,
        stream_id: Option<String>,
    },
    Fail(TransportError),
    NeverResponds,
}

/// A [`Transport`] that answers every request with a scripted reply.
///
/// Each body chunk handed to the consumer counts as one read; use
/// [`reads`](Self::reads) to check how far a consumer pulled.
pub struct ScriptedTransport {
    reply: Reply,
    reads: Arc<AtomicUsize>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedTransport {
    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            reads: Arc::new(AtomicUsize::new(0)),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Respond successfully with a body delivering `chunks` as separate reads.
    pub fn chunks<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Vec<u8>>,
    {
        Self::with_reply(Reply::Body {
            chunks: chunks
                .into_iter()
                .map(|c| Ok(Bytes::from(c.into())))
                .collect(),
            hang: false,
            stream_id: None,
        })
    }

    /// Respond with a non-success status.
    pub fn status(code: u16) -> Self {
        Self::fail(TransportError::Status(code))
    }

    /// Fail to open with the given error.
    pub fn fail(err: TransportError) -> Self {
        Self::with_reply(Reply::Fail(err))
    }

    /// Never produce response headers.
    pub fn never_responds() -> Self {
        Self::with_reply(Reply::NeverResponds)
    }

    /// After the scripted chunks, keep the body open without producing more.
    pub fn then_hang(mut self) -> Self {
        if let Reply::Body { hang, .. } = &mut self.reply {
            *hang = true;
        }
        self
    }

    /// After the scripted chunks, fail the next read with `err`.
    pub fn then_fail(mut self, err: TransportError) -> Self {
        if let Reply::Body { chunks, .. } = &mut self.reply {
            chunks.push(Err(err));
        }
        self
    }

    /// Report a server-assigned stream id.
    pub fn stream_id(mut self, id: impl Into<String>) -> Self {
        if let Reply::Body { stream_id, .. } = &mut self.reply {
            *stream_id = Some(id.into());
        }
        self
    }

    /// Number of body reads handed out so far, across all requests.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn open(
        &self,
        request: &GenerateRequest,
    ) -> impl Future<Output = Result<ResponseStream, TransportError>> + Send {
        self.requests.lock().unwrap().push(request.clone());

        let opened = match &self.reply {
            Reply::Body {
                chunks,
                hang,
                stream_id,
            } => {
                let reads = Arc::clone(&self.reads);
                let scripted = futures::stream::iter(chunks.clone()).inspect(move |_| {
                    reads.fetch_add(1, Ordering::SeqCst);
                });
                let body: ByteStream = if *hang {
                    Box::pin(scripted.chain(futures::stream::pending()))
                } else {
                    Box::pin(scripted)
                };
                Some(Ok(ResponseStream {
                    stream_id: stream_id.clone(),
                    body,
                }))
            }
            Reply::Fail(err) => Some(Err(err.clone())),
            Reply::NeverResponds => None,
        };

        async move {
            match opened {
                Some(result) => result,
                None => futures::future::pending().await,
            }
        }
    }
}
