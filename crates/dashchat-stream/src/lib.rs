//! Client-side streaming chat pipeline for the dashboard assistant.
//!
//! A [`ChatClient`] holds the transport and collaborators; each chat turn runs
//! in its own single-use [`ChatSession`], which posts the message, decodes the
//! newline-delimited `data: <json>` body with a [`FrameDecoder`] and streams
//! the answer into its [`Transcript`].
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use dashchat_stream::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), SessionError> {
//! let client = ChatClient::builder()
//!     .http(ChatClientConfig::new("http://localhost:3000/api/chat-stream"))?
//!     .credentials(Arc::new(EnvCredential::new()))
//!     .build()?;
//!
//! let mut session = client.session();
//! let state = session.start("How is revenue trending?").await?;
//! if state == SessionState::Completed {
//!     println!("{}", session.assistant_reply().unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```

/// Shared client and session factory.
pub mod client;
/// HTTP client configuration.
pub mod config;
/// Line decoder for the response body.
pub mod decoder;
/// Error taxonomy.
pub mod errors;
/// Session notifications.
pub mod event;
/// Decoded stream events.
pub mod frame;
/// Conversation messages and transcript.
pub mod message;
/// Tracing setup.
pub mod observability;
/// Common imports for typical usage.
pub mod prelude;
/// Credential, context and narration collaborators.
pub mod provider;
/// Stream session controller.
pub mod session;
/// Request body and transport seam.
pub mod transport;

pub use client::{ChatClient, ChatClientBuilder};
pub use config::ChatClientConfig;
pub use decoder::FrameDecoder;
pub use errors::{SessionError, SessionFailure, TransportError};
pub use event::SessionEvent;
pub use frame::Frame;
pub use message::{Message, Role, Transcript};
pub use provider::{
    ContextProvider, CredentialProvider, DashboardSnapshot, EnvCredential, NarrationSink,
    StaticCredential,
};
pub use session::{AbortHandle, ChatSession, SessionState};
pub use transport::{ByteStream, ChatRequest, ChatTransport, HttpTransport};
