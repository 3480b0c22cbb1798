use crate::errors::SessionFailure;
use crate::session::SessionState;

/// Notifications published by a `ChatSession` as it runs.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    /// Session moved to a new state.
    StateChanged {
        session_id: uuid::Uuid,
        state: SessionState,
    },
    /// Text appended to the assistant reply.
    ContentDelta {
        session_id: uuid::Uuid,
        seq: u64,
        text: String,
    },
    /// Terminal success with the final assistant content.
    Completed {
        session_id: uuid::Uuid,
        content: String,
    },
    /// Terminal failure.
    Failed {
        session_id: uuid::Uuid,
        failure: SessionFailure,
    },
    /// Terminal cancellation with whatever content had streamed in.
    Cancelled {
        session_id: uuid::Uuid,
        partial: String,
    },
}

impl SessionEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionEvent::Completed { .. }
                | SessionEvent::Failed { .. }
                | SessionEvent::Cancelled { .. }
        )
    }
}
