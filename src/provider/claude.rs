//! Direct claude.ai provider, authenticated by a browser session key.
//!
//! Two request shapes are supported: a single JSON round trip against the chat
//! endpoint, and a streamed completion against the streaming endpoint.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use reqwest::Url;
use reqwest::cookie::Jar;
use serde_json::Value;
use tracing::{debug, error};

use crate::core::{
    ChatRequest, ClientError, FragmentStream, GenerationOptions, HttpClient, HttpClientConfig,
    TransportError,
};
use crate::provider::constants::claude;

/// Configuration for [`ClaudeDirectProvider`]
#[derive(Debug, Clone)]
pub struct ClaudeDirectConfig {
    pub session_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub http_config: HttpClientConfig,
}

impl Default for ClaudeDirectConfig {
    fn default() -> Self {
        Self {
            session_key: None,
            model: claude::DEFAULT_MODEL.to_string(),
            base_url: claude::API_BASE.to_string(),
            http_config: HttpClientConfig::default(),
        }
    }
}

impl ClaudeDirectConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session_key(mut self, session_key: impl Into<String>) -> Self {
        self.session_key = Some(session_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http_config.timeout = timeout;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_http_config(mut self, config: HttpClientConfig) -> Self {
        self.http_config = config;
        self
    }
}

/// Long-lived client for the claude.ai chat endpoints.
///
/// Without a session key every generation call fails with
/// [`ClientError::InvalidState`] before touching the network.
pub struct ClaudeDirectProvider {
    session_key: Option<String>,
    model: String,
    base_url: Url,
    http_config: HttpClientConfig,
    http: HttpClient,
}

impl ClaudeDirectProvider {
    pub fn new(config: ClaudeDirectConfig) -> Result<Self, ClientError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ClientError::Configuration(format!("Invalid base URL '{}': {e}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Configuration(format!(
                "Invalid base URL '{}': not a base URL",
                config.base_url
            )));
        }

        let http = HttpClient::new(config.http_config.clone(), Arc::new(Jar::default()))?;
        let mut provider = Self {
            session_key: None,
            model: config.model,
            base_url,
            http_config: config.http_config,
            http,
        };

        if let Some(session_key) = config.session_key {
            provider.set_session_key(session_key)?;
        }

        Ok(provider)
    }

    /// Provider with the default model, endpoint and timeout.
    pub fn with_session_key(session_key: impl Into<String>) -> Result<Self, ClientError> {
        Self::new(ClaudeDirectConfig::new().with_session_key(session_key))
    }

    /// Reads the session key from `CLAUDE_SESSION_KEY`.
    pub fn from_env() -> Result<Self, ClientError> {
        let session_key = std::env::var(claude::SESSION_KEY_ENV_VAR).map_err(|_| {
            ClientError::Configuration(format!("{} not set.", claude::SESSION_KEY_ENV_VAR))
        })?;
        Self::with_session_key(session_key)
    }

    /// Replaces the session key and all cookie state of the transport.
    ///
    /// Takes effect on the next request. A key that cannot be sent verbatim
    /// as a cookie value is rejected and the previous state is kept.
    pub fn set_session_key(&mut self, session_key: impl Into<String>) -> Result<(), ClientError> {
        let session_key = session_key.into();
        validate_cookie_value(&session_key)?;

        let jar = Arc::new(Jar::default());
        jar.add_cookie_str(
            &format!("{}={}; Path=/", claude::SESSION_COOKIE, session_key),
            &self.base_url,
        );
        self.http = HttpClient::new(self.http_config.clone(), jar)?;
        self.session_key = Some(session_key);

        debug!("Session key updated");
        Ok(())
    }

    pub fn session_key(&self) -> Option<&str> {
        self.session_key.as_deref()
    }

    /// The `sessionKey` cookie the transport will attach to the next request.
    pub fn session_cookie(&self) -> Option<String> {
        self.http.cookie(&self.base_url, claude::SESSION_COOKIE)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn timeout(&self) -> Duration {
        self.http.timeout()
    }

    fn ensure_authenticated(&self) -> Result<(), ClientError> {
        match self.session_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(()),
            _ => Err(ClientError::InvalidState(
                "Session key is required. Use set_session_key() to set it.".to_string(),
            )),
        }
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), endpoint)
    }

    /// Generates a complete response for `prompt`.
    ///
    /// Text blocks of the response `content` are concatenated in order. A
    /// successful response without that shape is returned as serialized JSON.
    #[tracing::instrument(
        name = "generate",
        skip(self, prompt, options),
        fields(model = %self.model)
    )]
    pub async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, ClientError> {
        self.ensure_authenticated()?;

        let request = ChatRequest::new(&self.model, prompt, options, false);
        let url = self.endpoint_url(claude::CHAT_ENDPOINT);
        debug!(conversation_uuid = %request.conversation_uuid, %url, "Sending chat request");

        let response = self.http.post_json(&url, &request).await.map_err(|e| {
            error!(error = %e, "Error communicating with Claude");
            ClientError::Transport(e)
        })?;

        Ok(extract_text(response))
    }

    /// Streams the response for `prompt` as text fragments.
    ///
    /// Resolves once the upstream accepted the request; fragments are read
    /// from the connection as the returned stream is polled.
    #[tracing::instrument(
        name = "stream_generate",
        skip(self, prompt, options),
        fields(model = %self.model)
    )]
    pub async fn stream_generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<FragmentStream, ClientError> {
        self.ensure_authenticated()?;

        let request = ChatRequest::new(&self.model, prompt, options, true);
        let url = self.endpoint_url(claude::CHAT_STREAM_ENDPOINT);
        debug!(
            conversation_uuid = %request.conversation_uuid,
            %url,
            "Sending streaming chat request"
        );

        let response = self.http.post_stream(&url, &request).await.map_err(|e| {
            error!(error = %e, "Error streaming from Claude");
            ClientError::Transport(e)
        })?;

        let timeout = self.http.timeout();
        let body = response.bytes_stream().map(move |chunk| {
            chunk.map_err(|e| TransportError::from_reqwest(e, timeout, "Stream read error"))
        });

        Ok(FragmentStream::new(Box::pin(body)))
    }
}

/// Cookie values are limited to the RFC 6265 `cookie-octet` set: printable
/// ASCII except whitespace, `"`, `,`, `;` and `\`.
fn validate_cookie_value(value: &str) -> Result<(), ClientError> {
    let invalid = value.bytes().find(|b| {
        !matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
    });
    match invalid {
        None => Ok(()),
        Some(byte) => Err(ClientError::Configuration(format!(
            "Session key contains a character not allowed in a cookie value (byte 0x{byte:02x})"
        ))),
    }
}

/// Text of a non-streaming response.
///
/// Concatenates every `{"type": "text", "text": ...}` item of `content` with no
/// separator. Falls back to the serialized body when `content` is not a list.
pub fn extract_text(response: Value) -> String {
    match response.get("content") {
        Some(Value::Array(items)) => items
            .iter()
            .filter(|item| item.get("type").and_then(Value::as_str) == Some("text"))
            .filter_map(|item| item.get("text").and_then(Value::as_str))
            .collect(),
        _ => response.to_string(),
    }
}
