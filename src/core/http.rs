//! Cookie-authenticated HTTP transport shared by both chat endpoints.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use reqwest::cookie::{CookieStore, Jar};
use serde::Serialize;
use tracing::{debug, warn};

use super::error::{ClientError, TransportError};

/// Configuration for the HTTP transport
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Bounds connecting and every read. Non-streaming calls are also bounded in total.
    pub timeout: Duration,
    pub user_agent: Option<String>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            user_agent: None,
        }
    }
}

/// reqwest client bound to a single cookie jar.
///
/// The jar is fixed when the client is built, so replacing cookie state means
/// building a new `HttpClient`.
pub struct HttpClient {
    client: reqwest::Client,
    jar: Arc<Jar>,
    config: HttpClientConfig,
}

impl HttpClient {
    pub fn new(config: HttpClientConfig, jar: Arc<Jar>) -> Result<Self, ClientError> {
        let default_ua = format!("claude-direct/{}", env!("CARGO_PKG_VERSION"));
        let ua = config.user_agent.as_deref().unwrap_or(&default_ua);

        let client = reqwest::Client::builder()
            .connect_timeout(config.timeout)
            .read_timeout(config.timeout)
            .user_agent(ua)
            .cookie_provider(Arc::clone(&jar))
            .build()
            .map_err(|e| {
                ClientError::Configuration(format!("Failed to build reqwest client: {e}"))
            })?;

        Ok(Self {
            client,
            jar,
            config,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// Value of the named cookie the jar would send to `url`.
    pub fn cookie(&self, url: &Url, name: &str) -> Option<String> {
        let header = self.jar.cookies(url)?;
        let header = header.to_str().ok()?;
        header.split(';').find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name).then(|| value.to_string())
        })
    }

    /// POST a JSON body and decode the JSON response.
    #[tracing::instrument(name = "http_post_json", skip(self, body), fields(url = %url))]
    pub async fn post_json<Req>(
        &self,
        url: &str,
        body: &Req,
    ) -> Result<serde_json::Value, TransportError>
    where
        Req: Serialize,
    {
        let response = self
            .client
            .post(url)
            .timeout(self.config.timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e, "Request failed"))?;
        let response = check_status(response).await?;

        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(e, "Failed to read response body"))?;
        debug!(bytes = text.len(), "HTTP request successful");

        serde_json::from_str(&text).map_err(|e| TransportError::Decode {
            message: "Failed to parse response as JSON".to_string(),
            source: Box::new(e),
        })
    }

    /// POST a JSON body and hand back the response once headers arrive.
    ///
    /// The body is left unread so the caller can consume it incrementally.
    #[tracing::instrument(name = "http_post_stream", skip(self, body), fields(url = %url))]
    pub async fn post_stream<Req>(
        &self,
        url: &str,
        body: &Req,
    ) -> Result<reqwest::Response, TransportError>
    where
        Req: Serialize,
    {
        let timeout = self.config.timeout;
        let send = self
            .client
            .post(url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(body)
            .send();

        // A total timeout would cut off long streams, so only the wait for headers is bounded.
        let response = tokio::time::timeout(timeout, send)
            .await
            .map_err(|_| TransportError::Timeout { timeout })?
            .map_err(|e| self.transport_error(e, "Request failed"))?;
        check_status(response).await
    }

    pub(crate) fn transport_error(&self, e: reqwest::Error, context: &str) -> TransportError {
        TransportError::from_reqwest(e, self.config.timeout, context)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    warn!(status = %status, "API returned error status");
    Err(TransportError::Status {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_cookie_back_from_jar() {
        let jar = Arc::new(Jar::default());
        let url: Url = "https://claude.ai".parse().unwrap();
        jar.add_cookie_str("sessionKey=abc123; Path=/", &url);

        let client = HttpClient::new(HttpClientConfig::default(), jar).unwrap();
        assert_eq!(client.cookie(&url, "sessionKey").as_deref(), Some("abc123"));
        assert_eq!(client.cookie(&url, "other"), None);
    }

    #[test]
    fn empty_jar_has_no_cookie() {
        let client =
            HttpClient::new(HttpClientConfig::default(), Arc::new(Jar::default())).unwrap();
        let url: Url = "https://claude.ai/api/chat".parse().unwrap();
        assert_eq!(client.cookie(&url, "sessionKey"), None);
    }

    #[test]
    fn default_timeout_is_two_minutes() {
        assert_eq!(HttpClientConfig::default().timeout, Duration::from_secs(120));
    }
}
