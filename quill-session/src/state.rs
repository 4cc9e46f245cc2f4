//! Session state, snapshots, and watchers.

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Lifecycle phase derived from the `pending` and `active` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No request in flight.
    Idle,
    /// Request sent, awaiting response headers.
    Pending,
    /// Response body being consumed.
    Streaming,
}

/// Point-in-time copy of the session's visible state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// The user's draft text.
    pub draft: String,
    /// Text accumulated from the current (or last) stream.
    pub output: String,
    /// Request in flight, no response yet.
    pub pending: bool,
    /// Stream not yet terminated.
    pub active: bool,
    /// Server-assigned id of the current (or last) stream.
    pub stream_id: Option<String>,
    /// Malformed frames skipped during the current (or last) stream.
    pub skipped_frames: usize,
}

impl Snapshot {
    /// The lifecycle phase.
    pub fn phase(&self) -> Phase {
        match (self.active, self.pending) {
            (false, _) => Phase::Idle,
            (true, true) => Phase::Pending,
            (true, false) => Phase::Streaming,
        }
    }

    /// Whether a submission would start a request.
    pub fn can_submit(&self) -> bool {
        !self.draft.trim().is_empty() && !self.active && !self.pending
    }

    /// Whether there is finished output to clear.
    pub fn can_reset(&self) -> bool {
        !self.output.is_empty() && !self.active
    }
}

/// Full session state, including the cancellation handle.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub(crate) view: Snapshot,
    /// Handle of the live submission. `Some` exactly while `view.active`.
    pub(crate) handle: Option<CancellationToken>,
    /// Incremented on every submission; stale cycles compare against it.
    pub(crate) generation: u64,
}

impl SessionState {
    /// Return to idle, dropping the handle.
    pub(crate) fn settle(&mut self) {
        self.view.pending = false;
        self.view.active = false;
        self.handle = None;
    }

    /// Whether `generation` is the live submission.
    pub(crate) fn is_live(&self, generation: u64) -> bool {
        self.generation == generation && self.handle.is_some()
    }
}

/// Receives a notification on every session state change.
///
/// Obtained from [`Session::subscribe`](crate::Session::subscribe).
#[derive(Debug, Clone)]
pub struct SessionWatcher {
    pub(crate) rx: watch::Receiver<SessionState>,
}

impl SessionWatcher {
    /// The current state.
    pub fn snapshot(&self) -> Snapshot {
        self.rx.borrow().view.clone()
    }

    /// Wait for the next change and return the new state.
    ///
    /// Returns `None` once the session has been dropped.
    pub async fn changed(&mut self) -> Option<Snapshot> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().view.clone())
    }

    /// Wait until the state satisfies `predicate` (checked against the
    /// current state first).
    ///
    /// Returns `None` if the session is dropped before that happens.
    pub async fn wait_for(
        &mut self,
        mut predicate: impl FnMut(&Snapshot) -> bool,
    ) -> Option<Snapshot> {
        self.rx
            .wait_for(|state| predicate(&state.view))
            .await
            .ok()
            .map(|state| state.view.clone())
    }
}
