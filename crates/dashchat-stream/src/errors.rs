use crate::session::SessionState;

/// Errors returned by a `ChatTransport` before they are folded into a
/// session's terminal state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Endpoint answered with a non-success HTTP status.
    #[error("request rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
    /// Connecting, sending, or reading the body failed.
    #[error("network error: {message}")]
    Network { message: String },
}

impl TransportError {
    /// Creates a rejection error for a non-success status.
    pub fn rejected(status: u16, body: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            body: body.into(),
        }
    }

    /// Creates a network-level error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }
}

/// Terminal failure recorded on a session that ended in `SessionState::Failed`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, serde::Serialize, serde::Deserialize)]
pub enum SessionFailure {
    /// Request was refused before any assistant content existed (non-success
    /// status or no credential available).
    #[error("request rejected: {reason}")]
    RequestRejected { status: Option<u16>, reason: String },
    /// Server sent an explicit `error` event in the stream.
    #[error("assistant error: {message}")]
    InBand { message: String },
    /// The connection failed or the body ended before an `end` event.
    #[error("transport failure: {message}")]
    Transport { message: String },
}

impl SessionFailure {
    pub(crate) fn missing_credential() -> Self {
        Self::RequestRejected {
            status: None,
            reason: "no API credential is configured".into(),
        }
    }
}

impl From<TransportError> for SessionFailure {
    fn from(value: TransportError) -> Self {
        match value {
            TransportError::Rejected { status, body } => {
                let body = body.trim();
                let reason = if body.is_empty() {
                    format!("endpoint returned status {status}")
                } else {
                    format!("endpoint returned status {status}: {body}")
                };
                SessionFailure::RequestRejected {
                    status: Some(status),
                    reason,
                }
            }
            TransportError::Network { message } => SessionFailure::Transport { message },
        }
    }
}

/// Caller-boundary errors. These only report misuse or misconfiguration; a
/// started session always resolves to a terminal `SessionState` instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Invalid client or transport configuration.
    #[error("config error: {0}")]
    Config(String),
    /// Invalid input to `start`.
    #[error("validation error: {0}")]
    Validation(String),
    /// `start` was called on a session that already ran.
    #[error("session already started (state: {state})")]
    AlreadyStarted { state: SessionState },
}
