use std::pin::Pin;

use futures::StreamExt as _;
use serde::Serialize;
use tracing::debug;

use crate::config::ChatClientConfig;
use crate::errors::{SessionError, TransportError};
use crate::message::Message;

/// Incremental response body: raw chunks in arrival order.
pub type ByteStream =
    Pin<Box<dyn futures::Stream<Item = Result<bytes::Bytes, TransportError>> + Send + 'static>>;

/// JSON body posted to the chat-stream endpoint.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    pub conversation_history: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_data: Option<serde_json::Value>,
}

/// Opens one streamed chat response.
///
/// Implementations resolve once response headers are in: `Ok` carries the
/// body for a success status, `Err(TransportError::Rejected)` a non-success
/// status. Dropping the returned stream aborts the connection.
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    async fn open(
        &self,
        request: &ChatRequest,
        credential: &str,
    ) -> Result<ByteStream, TransportError>;
}

/// `ChatTransport` over HTTP using reqwest.
pub struct HttpTransport {
    client: reqwest::Client,
    config: ChatClientConfig,
}

impl HttpTransport {
    pub fn new(config: ChatClientConfig) -> Result<Self, SessionError> {
        if config.endpoint.trim().is_empty() {
            return Err(SessionError::Config("chat endpoint must not be empty".into()));
        }
        if reqwest::header::HeaderName::from_bytes(config.credential_header.as_bytes()).is_err() {
            return Err(SessionError::Config(format!(
                "invalid credential header name: {}",
                config.credential_header
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SessionError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, SessionError> {
        Self::new(ChatClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ChatClientConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl ChatTransport for HttpTransport {
    async fn open(
        &self,
        request: &ChatRequest,
        credential: &str,
    ) -> Result<ByteStream, TransportError> {
        debug!(
            endpoint = %self.config.endpoint,
            history = request.conversation_history.len(),
            has_context = request.current_data.is_some(),
            "opening chat stream"
        );
        let response = self
            .client
            .post(&self.config.endpoint)
            .header(self.config.credential_header.as_str(), credential)
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError::network(format!("chat request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(TransportError::rejected(status.as_u16(), body));
        }

        let body = response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| TransportError::network(format!("stream read failed: {e}")))
        });
        Ok(Box::pin(body))
    }
}
