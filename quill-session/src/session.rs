//! The session controller.

use futures::StreamExt;
use quill_stream::{Frame, frame_stream};
use quill_types::{GenerateRequest, GenerationParams, Transport};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::SessionError;
use crate::outcome::{Completion, Outcome, Rejection};
use crate::state::{Phase, SessionState, SessionWatcher, Snapshot};

/// Output shown after a failed submission.
pub const FAILURE_MESSAGE: &str = "Error generating poem. Please try again.";

/// Owns the draft, the accumulated output, the lifecycle flags and the
/// cancellation handle of one generation stream at a time.
///
/// # Example
///
/// ```no_run
/// use quill_http::HttpTransport;
/// use quill_session::Session;
///
/// # async fn run() {
/// let session = Session::new(HttpTransport::new());
/// session.set_draft("Shall I compare thee to a summer's day?");
/// let outcome = session.submit().await;
/// println!("{outcome:?}: {}", session.output());
/// # }
/// ```
pub struct Session<T> {
    transport: T,
    params: GenerationParams,
    state: watch::Sender<SessionState>,
}

impl<T: Transport> Session<T> {
    /// Create an idle session with the default generation parameters.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            params: GenerationParams::default(),
            state: watch::Sender::new(SessionState::default()),
        }
    }

    /// Override the generation parameters sent with every request.
    #[must_use]
    pub fn params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The generation parameters in use.
    pub fn generation_params(&self) -> GenerationParams {
        self.params
    }

    /// Replace the draft text.
    pub fn set_draft(&self, text: impl Into<String>) {
        let text = text.into();
        self.state.send_if_modified(|state| {
            if state.view.draft == text {
                return false;
            }
            state.view.draft = text;
            true
        });
    }

    /// The current draft text.
    pub fn draft(&self) -> String {
        self.state.borrow().view.draft.clone()
    }

    /// The accumulated output.
    pub fn output(&self) -> String {
        self.state.borrow().view.output.clone()
    }

    /// The current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.state.borrow().view.phase()
    }

    /// Copy of the visible state.
    pub fn snapshot(&self) -> Snapshot {
        self.state.borrow().view.clone()
    }

    /// Whether [`submit`](Self::submit) would start a request.
    pub fn can_submit(&self) -> bool {
        self.state.borrow().view.can_submit()
    }

    /// Whether there is finished output for [`reset`](Self::reset) to clear.
    pub fn can_reset(&self) -> bool {
        self.state.borrow().view.can_reset()
    }

    /// Watch state changes, e.g. to render output as it streams in.
    pub fn subscribe(&self) -> SessionWatcher {
        SessionWatcher {
            rx: self.state.subscribe(),
        }
    }

    /// Submit the trimmed draft and consume the response stream.
    ///
    /// Does nothing if the draft is blank or a stream is already live.
    /// Otherwise clears the output, issues one request, and appends every
    /// text fragment in arrival order until the `[DONE]` sentinel, the end
    /// of the body, a [`stop`](Self::stop), or an error. On error the output
    /// is replaced with [`FAILURE_MESSAGE`]. Every path ends idle.
    pub async fn submit(&self) -> Outcome {
        let (generation, token, request) = match self.begin() {
            Ok(started) => started,
            Err(rejection) => {
                tracing::debug!(?rejection, "submission ignored");
                return Outcome::Ignored(rejection);
            }
        };

        let guard = SubmitGuard {
            state: &self.state,
            generation,
            token: token.clone(),
            armed: true,
        };
        let result = self.consume(generation, &token, &request).await;
        let outcome = self.finish(generation, result);
        guard.disarm();
        outcome
    }

    /// Stop the live stream, if any.
    ///
    /// Clears both flags immediately; the suspended [`submit`](Self::submit)
    /// wakes, recognizes the cancellation, and leaves the output untouched.
    /// Returns whether there was a live handle to cancel.
    pub fn stop(&self) -> bool {
        let mut stopped = false;
        self.state.send_if_modified(|state| {
            let was_busy = state.view.active || state.view.pending;
            if let Some(token) = state.handle.take() {
                token.cancel();
                stopped = true;
            }
            state.settle();
            was_busy
        });
        if stopped {
            tracing::debug!("stream stopped");
        }
        stopped
    }

    /// Clear the output and the draft.
    ///
    /// Meant for an idle session (see [`can_reset`](Self::can_reset)); a live
    /// stream keeps appending to the cleared output.
    pub fn reset(&self) {
        self.state.send_if_modified(|state| {
            if state.view.output.is_empty() && state.view.draft.is_empty() {
                return false;
            }
            state.view.output.clear();
            state.view.draft.clear();
            true
        });
    }

    /// Idle → Pending: validate, then arm a fresh cancellation handle.
    fn begin(&self) -> Result<(u64, CancellationToken, GenerateRequest), Rejection> {
        let mut started = Err(Rejection::Busy);
        self.state.send_if_modified(|state| {
            if state.view.active || state.view.pending {
                return false;
            }
            if state.view.draft.trim().is_empty() {
                started = Err(Rejection::EmptyDraft);
                return false;
            }

            let token = CancellationToken::new();
            state.generation += 1;
            state.handle = Some(token.clone());
            state.view.pending = true;
            state.view.active = true;
            state.view.output.clear();
            state.view.stream_id = None;
            state.view.skipped_frames = 0;

            let request = GenerateRequest::new(&state.view.draft, self.params);
            started = Ok((state.generation, token, request));
            true
        });
        started
    }

    /// Pending → Streaming → end of stream. Every await races the handle.
    async fn consume(
        &self,
        generation: u64,
        token: &CancellationToken,
        request: &GenerateRequest,
    ) -> Result<Completion, SessionError> {
        let response = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(SessionError::Cancelled),
            opened = self.transport.open(request) => opened?,
        };

        let stream_id = response.stream_id.clone();
        tracing::debug!(generation, stream_id = ?stream_id, "stream opened");
        self.update(generation, |state| {
            state.view.pending = false;
            state.view.stream_id = stream_id;
        });

        let mut frames = std::pin::pin!(frame_stream(response.body));
        loop {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(SessionError::Cancelled),
                next = frames.next() => next,
            };

            match next {
                None => return Ok(Completion::Exhausted),
                Some(Err(e)) => return Err(e.into()),
                Some(Ok(Frame::Done)) => return Ok(Completion::Sentinel),
                Some(Ok(Frame::Chunk(chunk))) => {
                    if let Some(error) = chunk.server_error() {
                        tracing::warn!(
                            generation,
                            error = %error,
                            "generation service reported an error"
                        );
                    }
                    if let Some(text) = chunk.fragment() {
                        self.update(generation, |state| state.view.output.push_str(text));
                    }
                }
                Some(Ok(Frame::Malformed(payload))) => {
                    tracing::debug!(generation, payload = %payload, "skipping malformed frame");
                    self.update(generation, |state| state.view.skipped_frames += 1);
                }
            }
        }
    }

    /// Streaming → Idle, applying the outcome to the visible state.
    fn finish(&self, generation: u64, result: Result<Completion, SessionError>) -> Outcome {
        match result {
            Ok(completion) => {
                self.update(generation, SessionState::settle);
                tracing::info!(generation, ?completion, "stream completed");
                Outcome::Completed(completion)
            }
            Err(SessionError::Cancelled) => {
                self.update(generation, SessionState::settle);
                tracing::debug!(generation, "request was aborted");
                Outcome::Cancelled
            }
            Err(err) => {
                tracing::warn!(generation, error = %err, "generation failed");
                self.update(generation, |state| {
                    state.view.output = FAILURE_MESSAGE.to_string();
                    state.settle();
                });
                Outcome::Failed(err)
            }
        }
    }

    fn update(&self, generation: u64, f: impl FnOnce(&mut SessionState)) {
        update_live(&self.state, generation, f);
    }
}

/// Apply `f` only while `generation` is still the live submission.
fn update_live(
    state: &watch::Sender<SessionState>,
    generation: u64,
    f: impl FnOnce(&mut SessionState),
) {
    state.send_if_modified(|state| {
        if !state.is_live(generation) {
            return false;
        }
        f(state);
        true
    });
}

/// Cancels and settles a submission whose future is dropped before it
/// reaches [`Session::finish`], e.g. by a timeout or a losing `select!` arm.
struct SubmitGuard<'a> {
    state: &'a watch::Sender<SessionState>,
    generation: u64,
    token: CancellationToken,
    armed: bool,
}

impl SubmitGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.token.cancel();
        update_live(self.state, self.generation, SessionState::settle);
        tracing::debug!(
            generation = self.generation,
            "submission dropped before completion"
        );
    }
}

impl<T> Drop for Session<T> {
    fn drop(&mut self) {
        self.state.send_if_modified(|state| match state.handle.take() {
            Some(token) => {
                token.cancel();
                state.settle();
                true
            }
            None => false,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_types::TransportError;
    use quill_types::test_utils::ScriptedTransport;

    fn session(transport: ScriptedTransport, draft: &str) -> Session<ScriptedTransport> {
        let session = Session::new(transport);
        session.set_draft(draft);
        session
    }

    #[tokio::test]
    async fn sentinel_stops_reading() {
        let s = session(
            ScriptedTransport::chunks([
                r#"data: {"text":"Once"}"#,
                r#"data: {"text":" upon"}"#,
                "data: [DONE]",
                r#"data: {"text":" never"}"#,
            ]),
            "a time",
        );
        let outcome = s.submit().await;
        assert_eq!(outcome, Outcome::Completed(Completion::Sentinel));
        assert_eq!(s.output(), "Once upon");
        assert_eq!(s.transport().reads(), 3);
        assert_eq!(s.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn exhaustion_completes_cleanly() {
        let s = session(
            ScriptedTransport::chunks(["data: {\"text\":\"a\"}\n\n", "data: {\"text\":\"b\"}\n\n"]),
            "x",
        );
        assert_eq!(s.submit().await, Outcome::Completed(Completion::Exhausted));
        assert_eq!(s.output(), "ab");
        assert_eq!(s.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn malformed_frame_skipped() {
        let s = session(
            ScriptedTransport::chunks([
                r#"data: {"text":"Once"}"#,
                "data: not-json",
                r#"data: {"text":" upon"}"#,
                "data: [DONE]",
            ]),
            "x",
        );
        assert_eq!(s.submit().await, Outcome::Completed(Completion::Sentinel));
        assert_eq!(s.output(), "Once upon");
        assert_eq!(s.snapshot().skipped_frames, 1);
    }

    #[tokio::test]
    async fn blank_draft_ignored() {
        let s = session(ScriptedTransport::chunks(["data: [DONE]"]), "   ");
        assert_eq!(s.submit().await, Outcome::Ignored(Rejection::EmptyDraft));
        assert!(s.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn request_carries_trimmed_draft_and_params() {
        let params = GenerationParams::new(120, 0.9).unwrap();
        let s = Session::new(ScriptedTransport::chunks(["data: [DONE]"])).params(params);
        s.set_draft("  rough winds do shake  ");
        s.submit().await;
        let requests = s.transport().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].prompt, "rough winds do shake");
        assert_eq!(requests[0].max_length, 120);
        assert_eq!(requests[0].temperature, 0.9);
        // The draft itself is kept as typed.
        assert_eq!(s.draft(), "  rough winds do shake  ");
    }

    #[tokio::test]
    async fn status_failure_replaces_output() {
        let s = session(ScriptedTransport::status(500), "x");
        let outcome = s.submit().await;
        assert_eq!(
            outcome,
            Outcome::Failed(SessionError::Transport(TransportError::Status(500)))
        );
        assert_eq!(s.output(), FAILURE_MESSAGE);
        assert_eq!(s.transport().reads(), 0);
        let snap = s.snapshot();
        assert!(!snap.pending);
        assert!(!snap.active);
    }

    #[tokio::test]
    async fn read_failure_replaces_partial_output() {
        let s = session(
            ScriptedTransport::chunks([r#"data: {"text":"Once"}"#])
                .then_fail(TransportError::Read("reset".into())),
            "x",
        );
        assert!(matches!(s.submit().await, Outcome::Failed(_)));
        assert_eq!(s.output(), FAILURE_MESSAGE);
        assert_eq!(s.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn new_submission_clears_previous_output() {
        let s = session(
            ScriptedTransport::chunks([r#"data: {"text":"verse"}"#, "data: [DONE]"]),
            "x",
        );
        s.submit().await;
        s.submit().await;
        assert_eq!(s.output(), "verse");
    }

    #[tokio::test]
    async fn stop_while_streaming_keeps_output() {
        let s = session(
            ScriptedTransport::chunks([r#"data: {"text":"Once"}"#]).then_hang(),
            "x",
        );
        let mut watcher = s.subscribe();
        let (outcome, ()) = tokio::join!(s.submit(), async {
            watcher.wait_for(|snap| snap.output == "Once").await;
            assert_eq!(s.phase(), Phase::Streaming);
            assert!(s.stop());
        });
        assert_eq!(outcome, Outcome::Cancelled);
        assert_eq!(s.output(), "Once");
        let snap = s.snapshot();
        assert!(!snap.pending);
        assert!(!snap.active);
    }

    #[tokio::test]
    async fn stop_while_pending() {
        let s = session(ScriptedTransport::never_responds(), "x");
        let mut watcher = s.subscribe();
        let (outcome, ()) = tokio::join!(s.submit(), async {
            watcher.wait_for(|snap| snap.pending).await;
            assert_eq!(s.phase(), Phase::Pending);
            s.stop();
        });
        assert_eq!(outcome, Outcome::Cancelled);
        assert_eq!(s.output(), "");
        assert_eq!(s.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn stop_when_idle_is_noop() {
        let s = session(ScriptedTransport::chunks(["data: [DONE]"]), "x");
        assert!(!s.stop());
        assert_eq!(s.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn reset_clears_draft_and_output() {
        let s = session(
            ScriptedTransport::chunks([r#"data: {"text":"verse"}"#]),
            "x",
        );
        s.submit().await;
        assert!(s.can_reset());
        s.reset();
        assert_eq!(s.draft(), "");
        assert_eq!(s.output(), "");
        assert!(!s.can_reset());
    }

    #[tokio::test]
    async fn dropped_submit_cancels_its_handle() {
        let s = session(
            ScriptedTransport::chunks([r#"data: {"text":"Once"}"#]).then_hang(),
            "x",
        );
        let mut watcher = s.subscribe();
        let mut submit = Box::pin(s.submit());
        tokio::select! {
            _ = &mut submit => panic!("stream should still be live"),
            _ = watcher.wait_for(|snap| snap.phase() == Phase::Streaming) => {}
        }
        let token = s.state.borrow().handle.clone().expect("live handle");

        drop(submit);
        assert!(token.is_cancelled());
        assert_eq!(s.phase(), Phase::Idle);
        assert_eq!(s.output(), "Once");
        assert!(s.can_submit());
    }

    #[tokio::test]
    async fn dropping_session_cancels_live_stream() {
        let s = session(
            ScriptedTransport::chunks([r#"data: {"text":"Once"}"#]).then_hang(),
            "x",
        );
        let mut watcher = s.subscribe();
        let mut submit = Box::pin(s.submit());
        tokio::select! {
            _ = &mut submit => panic!("stream should still be live"),
            _ = watcher.wait_for(|snap| snap.phase() == Phase::Streaming) => {}
        }
        let token = s.state.borrow().handle.clone().expect("live handle");

        // Leak the suspended submission so only the session's own drop runs.
        std::mem::forget(submit);
        drop(s);

        assert!(token.is_cancelled());
        let last = watcher.changed().await.expect("final state published");
        assert_eq!(last.phase(), Phase::Idle);
        assert_eq!(last.output, "Once");
        assert!(watcher.changed().await.is_none());
    }

    #[tokio::test]
    async fn stream_id_recorded() {
        let s = session(
            ScriptedTransport::chunks(["data: [DONE]"]).stream_id("4f1c2a"),
            "x",
        );
        s.submit().await;
        assert_eq!(s.snapshot().stream_id.as_deref(), Some("4f1c2a"));
    }
}
