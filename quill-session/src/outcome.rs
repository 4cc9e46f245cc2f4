//! Result of one submission cycle.

use crate::error::SessionError;

/// How a stream finished normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The `[DONE]` sentinel arrived.
    Sentinel,
    /// The body ended without a sentinel.
    Exhausted,
}

/// Why a submission was not started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The draft is empty after trimming.
    EmptyDraft,
    /// A stream is already pending or active.
    Busy,
}

/// What [`Session::submit`](crate::Session::submit) did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The stream ran to completion.
    Completed(Completion),
    /// The stream was stopped; output was left as it was.
    Cancelled,
    /// The stream failed; output now holds the failure message.
    Failed(SessionError),
    /// Nothing was submitted.
    Ignored(Rejection),
}

impl Outcome {
    /// Whether a request was issued for this submission.
    pub fn was_submitted(&self) -> bool {
        !matches!(self, Outcome::Ignored(_))
    }
}
