//! Collaborators a session consults at its boundary: where the credential
//! comes from, what dashboard context rides along with a request, and who
//! reads the finished answer aloud.

use serde::{Deserialize, Serialize};

const DEFAULT_CREDENTIAL_ENV: &str = "DASHCHAT_API_KEY";

/// Supplies the API credential at request time.
pub trait CredentialProvider: Send + Sync {
    /// Returns the credential, or `None` when none is available.
    fn credential(&self) -> Option<String>;
}

/// Receives the final assistant answer of a completed session.
pub trait NarrationSink: Send + Sync {
    fn speak(&self, text: &str);
}

/// Supplies the optional `currentData` snapshot attached to a request.
pub trait ContextProvider: Send + Sync {
    fn snapshot(&self) -> Option<serde_json::Value>;
}

/// A fixed credential.
#[derive(Clone)]
pub struct StaticCredential(String);

impl StaticCredential {
    pub fn new(credential: impl Into<String>) -> Self {
        Self(credential.into())
    }
}

impl std::fmt::Debug for StaticCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticCredential(<redacted>)")
    }
}

impl CredentialProvider for StaticCredential {
    fn credential(&self) -> Option<String> {
        non_blank(&self.0)
    }
}

/// Reads the credential from an environment variable on every request.
#[derive(Clone, Debug)]
pub struct EnvCredential {
    var: String,
}

impl EnvCredential {
    /// Reads `DASHCHAT_API_KEY`.
    pub fn new() -> Self {
        Self::from_var(DEFAULT_CREDENTIAL_ENV)
    }

    pub fn from_var(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvCredential {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialProvider for EnvCredential {
    fn credential(&self) -> Option<String> {
        std::env::var(&self.var).ok().as_deref().and_then(non_blank)
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Current dashboard state sent as `currentData`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    #[serde(default)]
    pub metrics: serde_json::Value,
    #[serde(default)]
    pub trends: serde_json::Value,
    #[serde(default)]
    pub alerts: Vec<serde_json::Value>,
}

impl ContextProvider for DashboardSnapshot {
    fn snapshot(&self) -> Option<serde_json::Value> {
        serde_json::to_value(self).ok()
    }
}

impl ContextProvider for serde_json::Value {
    fn snapshot(&self) -> Option<serde_json::Value> {
        (!self.is_null()).then(|| self.clone())
    }
}
