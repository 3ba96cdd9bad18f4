//! Transport trait and the reqwest-backed implementation.

use crate::error::GenError;
use crate::types::{Payload, ResponseBody};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::Value;
use std::fmt::Debug;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Issues the single network call for a submission.
#[async_trait]
pub trait Transport: Send + Sync + Debug + 'static {
    /// POST the payload and decode the response body.
    ///
    /// Non-2xx answers come back as `GenError::Http`. Implementations may
    /// watch `cancel` to stop early; the dispatcher races the call against
    /// the same token, so an implementation that ignores it is still
    /// abandoned on cancellation.
    async fn send(
        &self,
        payload: Payload,
        cancel: &CancellationToken,
    ) -> Result<ResponseBody, GenError>;
}

/// Transport over `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with a default client
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a builder for more configuration options
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::default()
    }

    async fn post(&self, payload: Payload) -> Result<ResponseBody, GenError> {
        let mut headers = HeaderMap::with_capacity(payload.headers.len());
        for (name, value) in &payload.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| GenError::validation(format!("invalid header name {:?}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| GenError::validation(format!("invalid value for header {}: {}", name, e)))?;
            headers.insert(name, value);
        }

        // `headers` replaces what `json` set, so Content-Type is sent once.
        let response = self
            .client
            .post(&payload.endpoint)
            .json(&payload.body)
            .headers(headers)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            // An unreadable error body still reports the status.
            let raw = response.text().await.ok();
            return Err(status_error(status, raw.as_deref()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let raw = response.text().await?;

        Ok(ResponseBody::decode_as(content_type.as_deref(), &raw))
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        payload: Payload,
        cancel: &CancellationToken,
    ) -> Result<ResponseBody, GenError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(GenError::Cancelled),
            result = self.post(payload) => result,
        }
    }
}

/// Builder for `HttpTransport`
#[derive(Debug, Default)]
pub struct HttpTransportBuilder {
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl HttpTransportBuilder {
    /// Total request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// User-Agent header value
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Build the transport
    pub fn build(self) -> Result<HttpTransport, GenError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent);
        }

        let client = builder
            .build()
            .map_err(|e| GenError::configuration(format!("Failed to build HTTP client: {}", e)))?;
        Ok(HttpTransport { client })
    }
}

/// `GenError::Http` for a non-2xx status, preferring the body's own message
fn status_error(status: StatusCode, raw: Option<&str>) -> GenError {
    let message = raw.and_then(error_message).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Unknown Status")
            .to_string()
    });
    GenError::http(status.as_u16(), message)
}

/// Pull a human-readable message out of an error body.
///
/// Understands `{"message": ..}`, `{"error": {"message": ..}}`,
/// `{"error": ".."}` and `{"detail": ".."}`.
pub fn error_message(raw: &str) -> Option<String> {
    let json: Value = serde_json::from_str(raw).ok()?;
    let candidates = [
        json.get("message"),
        json.get("error").and_then(|e| e.get("message")),
        json.get("error"),
        json.get("detail"),
    ];

    let found = candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|msg| !msg.is_empty())
        .map(str::to_string);
    found
}
