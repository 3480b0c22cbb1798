use std::time::Duration;

use crate::errors::SessionError;

const DEFAULT_CREDENTIAL_HEADER: &str = "x-api-key";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for the HTTP chat-stream client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatClientConfig {
    /// Full URL of the chat-stream endpoint.
    pub endpoint: String,
    /// Header that carries the API credential.
    pub credential_header: String,
    /// Upper bound for a whole request, body included.
    pub timeout: Duration,
}

impl ChatClientConfig {
    /// Creates a config for the given endpoint with default header and timeout.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            credential_header: DEFAULT_CREDENTIAL_HEADER.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Builds a config from the environment.
    ///
    /// - `DASHCHAT_ENDPOINT` (required)
    /// - `DASHCHAT_CREDENTIAL_HEADER` (default `x-api-key`)
    /// - `DASHCHAT_TIMEOUT_SECS` (default 120)
    pub fn from_env() -> Result<Self, SessionError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SessionError> {
        let endpoint = lookup("DASHCHAT_ENDPOINT").unwrap_or_default();
        if endpoint.trim().is_empty() {
            return Err(SessionError::Config(
                "missing DASHCHAT_ENDPOINT for chat client".into(),
            ));
        }
        let mut config = Self::new(endpoint.trim());

        if let Some(header) = lookup("DASHCHAT_CREDENTIAL_HEADER")
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
        {
            config.credential_header = header;
        }

        if let Some(raw) = lookup("DASHCHAT_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                SessionError::Config(format!("invalid DASHCHAT_TIMEOUT_SECS value: {raw}"))
            })?;
            if secs == 0 {
                return Err(SessionError::Config(
                    "DASHCHAT_TIMEOUT_SECS must be greater than 0".into(),
                ));
            }
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Overrides the credential header name.
    pub fn credential_header(mut self, header: impl Into<String>) -> Self {
        self.credential_header = header.into();
        self
    }

    /// Overrides the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_endpoint_is_set() {
        let config = ChatClientConfig::from_lookup(lookup_from(&[(
            "DASHCHAT_ENDPOINT",
            " http://localhost:3000/api/chat ",
        )]))
        .expect("config");
        assert_eq!(config.endpoint, "http://localhost:3000/api/chat");
        assert_eq!(config.credential_header, "x-api-key");
        assert_eq!(config.timeout, Duration::from_secs(120));
    }

    #[test]
    fn missing_endpoint_is_a_config_error() {
        let err = ChatClientConfig::from_lookup(lookup_from(&[])).expect_err("must fail");
        assert!(matches!(
            err,
            SessionError::Config(message) if message.contains("DASHCHAT_ENDPOINT")
        ));
    }

    #[test]
    fn overrides_are_read_from_env() {
        let config = ChatClientConfig::from_lookup(lookup_from(&[
            ("DASHCHAT_ENDPOINT", "http://h/chat"),
            ("DASHCHAT_CREDENTIAL_HEADER", "authorization-token"),
            ("DASHCHAT_TIMEOUT_SECS", "15"),
        ]))
        .expect("config");
        assert_eq!(config.credential_header, "authorization-token");
        assert_eq!(config.timeout, Duration::from_secs(15));
    }

    #[test]
    fn bad_timeout_is_rejected() {
        for raw in ["soon", "0"] {
            let result = ChatClientConfig::from_lookup(lookup_from(&[
                ("DASHCHAT_ENDPOINT", "http://h/chat"),
                ("DASHCHAT_TIMEOUT_SECS", raw),
            ]));
            assert!(matches!(result, Err(SessionError::Config(_))), "{raw}");
        }
    }

    #[test]
    fn builder_setters_override_defaults() {
        let config = ChatClientConfig::new("http://h/chat")
            .credential_header("x-dashboard-key")
            .timeout(Duration::from_secs(5));
        assert_eq!(config.credential_header, "x-dashboard-key");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
