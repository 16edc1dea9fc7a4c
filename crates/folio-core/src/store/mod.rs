//! Client-side stores for session and project list state.
//!
//! Each store owns its state behind a mutex that is never held across an
//! `.await`. Async operations take a sequence ticket when they start and
//! only write their result back if no newer invocation of the same
//! operation has started since.

pub mod projects;
mod sequence;
pub mod session;

use crate::api::OperationError;

pub use projects::{ProjectsState, ProjectsStore};
pub use session::{SessionState, SessionStore};

/// Lifecycle of the most recent store operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestStatus {
    #[default]
    Idle,
    Loading,
    Error(OperationError),
}

impl RequestStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, RequestStatus::Loading)
    }

    pub fn error(&self) -> Option<&OperationError> {
        match self {
            RequestStatus::Error(err) => Some(err),
            _ => None,
        }
    }
}

pub type SessionStatus = RequestStatus;
