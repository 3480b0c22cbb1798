//! Logical events carried by the chat stream.
//!
//! Each event line holds a JSON envelope:
//! `{"type":"content","data":"..."}`, `{"type":"end"}` or
//! `{"type":"error","error":"..."}`.

use serde::Deserialize;
use serde_json::Value;

/// One decoded event from the response body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Frame {
    /// Incremental assistant text.
    Content(String),
    /// Server finished the response.
    End,
    /// Server reported a failure; the message is optional on the wire.
    Error(Option<String>),
}

impl Frame {
    /// Returns true for frames that end a session (`End` and `Error`).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Frame::End | Frame::Error(_))
    }

    /// Parses one JSON envelope.
    ///
    /// Returns `None` for bodies that are not valid JSON, that lack a known
    /// `type`, or whose `content` event has no string `data`. Fields an event
    /// type does not read are not type-checked.
    pub fn from_json(body: &str) -> Option<Self> {
        let envelope: Envelope = serde_json::from_str(body).ok()?;
        match envelope.kind.as_str() {
            "content" => match envelope.data {
                Some(Value::String(text)) => Some(Frame::Content(text)),
                _ => None,
            },
            "end" => Some(Frame::End),
            "error" => {
                let message = match envelope.error {
                    Some(Value::String(message)) if !message.trim().is_empty() => Some(message),
                    _ => None,
                };
                Some(Frame::Error(message))
            }
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}
