#![deny(missing_docs)]
//! Session controller for quill.
//!
//! A [`Session`] holds the user's draft, the accumulated output and the
//! two lifecycle flags, and drives one cancellable generation stream at a
//! time through a [`quill_types::Transport`]:
//!
//! ```text
//! Idle → Pending → Streaming → {Completed | Cancelled | Failed} → Idle
//! ```
//!
//! Every method takes `&self`, so a front end can call [`Session::stop`] or
//! read a [`Snapshot`] while [`Session::submit`] is suspended on the stream.
//! Renderers follow progress through a [`SessionWatcher`].

pub mod error;
pub mod outcome;
pub mod session;
pub mod state;

pub use error::SessionError;
pub use outcome::{Completion, Outcome, Rejection};
pub use session::{FAILURE_MESSAGE, Session};
pub use state::{Phase, SessionWatcher, Snapshot};
