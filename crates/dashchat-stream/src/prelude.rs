//! Common imports for driving chat sessions.
pub use crate::{
    AbortHandle, ChatClient, ChatClientBuilder, ChatClientConfig, ChatSession, DashboardSnapshot,
    EnvCredential, Frame, FrameDecoder, Message, Role, SessionError, SessionEvent,
    SessionFailure, SessionState, StaticCredential, Transcript,
};
