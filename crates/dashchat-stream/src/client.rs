use std::sync::Arc;

use crate::config::ChatClientConfig;
use crate::errors::SessionError;
use crate::message::{Message, Transcript};
use crate::provider::{ContextProvider, CredentialProvider, NarrationSink};
use crate::session::ChatSession;
use crate::transport::{ChatTransport, HttpTransport};

pub(crate) struct ClientInner {
    pub(crate) transport: Arc<dyn ChatTransport>,
    pub(crate) credentials: Arc<dyn CredentialProvider>,
    pub(crate) context: Option<Arc<dyn ContextProvider>>,
    pub(crate) narrator: Option<Arc<dyn NarrationSink>>,
}

/// Shared entry point that hands out single-use chat sessions.
///
/// Cloning is cheap; every session gets its own transcript and decoder.
#[derive(Clone)]
pub struct ChatClient {
    pub(crate) inner: Arc<ClientInner>,
}

impl ChatClient {
    pub fn builder() -> ChatClientBuilder {
        ChatClientBuilder::default()
    }

    /// Creates a session with an empty transcript.
    pub fn session(&self) -> ChatSession {
        ChatSession::new(self.inner.clone(), Transcript::new())
    }

    /// Creates a session whose transcript starts with earlier turns. Those
    /// turns are sent as the request's conversation history.
    pub fn session_with_history(&self, history: Vec<Message>) -> ChatSession {
        ChatSession::new(self.inner.clone(), Transcript::from(history))
    }
}

/// Builder for wiring a transport and its collaborators into a `ChatClient`.
#[derive(Default)]
pub struct ChatClientBuilder {
    transport: Option<Arc<dyn ChatTransport>>,
    credentials: Option<Arc<dyn CredentialProvider>>,
    context: Option<Arc<dyn ContextProvider>>,
    narrator: Option<Arc<dyn NarrationSink>>,
}

impl ChatClientBuilder {
    pub fn transport(mut self, transport: Arc<dyn ChatTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Uses an `HttpTransport` built from `config`.
    pub fn http(self, config: ChatClientConfig) -> Result<Self, SessionError> {
        Ok(self.transport(Arc::new(HttpTransport::new(config)?)))
    }

    pub fn credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn context(mut self, context: Arc<dyn ContextProvider>) -> Self {
        self.context = Some(context);
        self
    }

    pub fn narrator(mut self, narrator: Arc<dyn NarrationSink>) -> Self {
        self.narrator = Some(narrator);
        self
    }

    /// Builds the client. A transport and a credential provider are required.
    pub fn build(self) -> Result<ChatClient, SessionError> {
        let transport = self
            .transport
            .ok_or_else(|| SessionError::Config("chat client requires a transport".into()))?;
        let credentials = self.credentials.ok_or_else(|| {
            SessionError::Config("chat client requires a credential provider".into())
        })?;
        Ok(ChatClient {
            inner: Arc::new(ClientInner {
                transport,
                credentials,
                context: self.context,
                narrator: self.narrator,
            }),
        })
    }
}
