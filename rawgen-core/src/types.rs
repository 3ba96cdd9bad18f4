//! Core types for generation dispatch.

use crate::error::GenError;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tokio_util::sync::CancellationToken;

/// Backend identifier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BackendId {
    /// Text-completion style backend (prompt in, text out)
    Completion,
    /// Chat style backend (single user message in, assistant message out)
    Chat,
    /// Caller-configured endpoint with an optional credential
    Custom,
}

impl BackendId {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendId::Completion => "completion",
            BackendId::Chat => "chat",
            BackendId::Custom => "custom",
        }
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendId {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "completion" => Ok(BackendId::Completion),
            "chat" => Ok(BackendId::Chat),
            "custom" => Ok(BackendId::Custom),
            other => Err(GenError::unsupported_backend(other)),
        }
    }
}

/// Generation parameters supplied by the host
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GenerationParams {
    /// Model name, for backends that require one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,

    /// Temperature (0.0 - 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Top-p sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

impl GenerationParams {
    /// Set model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set max length
    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set top-p
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }
}

/// A single standalone prompt submission.
///
/// Owned by the dispatcher for the lifetime of one submission.
#[derive(Debug)]
pub struct GenerationRequest {
    pub prompt: String,
    pub backend: BackendId,
    pub override_endpoint: Option<String>,
    pub credential: Option<SecretString>,
    pub cancel: CancellationToken,
}

impl GenerationRequest {
    /// Create a new request; the prompt is trimmed.
    pub fn new(prompt: impl Into<String>, backend: BackendId) -> Self {
        Self {
            prompt: prompt.into().trim().to_string(),
            backend,
            override_endpoint: None,
            credential: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Set the endpoint that replaces the adapter default
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.override_endpoint = Some(endpoint.into());
        self
    }

    /// Set the credential sent as a bearer token
    pub fn with_credential(mut self, credential: SecretString) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Set the cancellation token
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Non-blank override endpoint, if any
    pub fn endpoint(&self) -> Option<&str> {
        self.override_endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }
}

/// Transport-ready request produced by an adapter
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    pub endpoint: String,
    pub body: serde_json::Value,
    pub headers: HashMap<String, String>,
}

impl Payload {
    /// Create a JSON payload for an endpoint
    pub fn json(endpoint: impl Into<String>, body: serde_json::Value) -> Self {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            endpoint: endpoint.into(),
            body,
            headers,
        }
    }

    /// Add a header, replacing any previous value
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Add ambient headers that the adapter did not set itself.
    ///
    /// Names compare case-insensitively; adapter headers win.
    pub fn merge_ambient(&mut self, ambient: HashMap<String, String>) {
        for (name, value) in ambient {
            let taken = self
                .headers
                .keys()
                .any(|existing| existing.eq_ignore_ascii_case(&name));
            if !taken {
                self.headers.insert(name, value);
            }
        }
    }
}

/// Decoded response body.
///
/// Backends answer either with a structured document or with plain text;
/// the two are kept apart rather than guessed at.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Text(String),
    Json(serde_json::Value),
}

impl ResponseBody {
    /// Decode raw bytes, preferring JSON when the body parses as JSON
    pub fn decode(raw: &str) -> Self {
        match serde_json::from_str(raw) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(raw.to_string()),
        }
    }

    /// Decode according to the declared media type.
    ///
    /// Only JSON media types (`application/json`, `*+json`) produce `Json`;
    /// any other declared type is text even if it parses as JSON. Without a
    /// declared type the body is sniffed with `decode`.
    pub fn decode_as(content_type: Option<&str>, raw: &str) -> Self {
        match content_type {
            Some(media) if is_json_media_type(media) => serde_json::from_str(raw)
                .map(ResponseBody::Json)
                .unwrap_or_else(|_| ResponseBody::Text(raw.to_string())),
            Some(_) => ResponseBody::Text(raw.to_string()),
            None => Self::decode(raw),
        }
    }
}

fn is_json_media_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

/// Failure classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FailureKind {
    Validation,
    UnsupportedBackend,
    Http { status: u16 },
    Network,
    Timeout,
    Serialization,
}

/// Classified outcome of one submission
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationResult {
    /// Text was extracted from the response
    Succeeded { text: String },
    /// The round trip succeeded but carried no extractable text
    EmptyResult,
    /// The submission failed after being accepted
    Failed { kind: FailureKind, message: String },
    /// The cancellation token fired while the call was outstanding
    Cancelled,
}

impl GenerationResult {
    /// Classify an error raised after the submission was accepted
    pub fn from_error(err: &GenError) -> Self {
        match err.kind() {
            Some(kind) => GenerationResult::Failed {
                kind,
                message: err.user_message(),
            },
            None => GenerationResult::Cancelled,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self,
            GenerationResult::Succeeded { .. } | GenerationResult::EmptyResult
        )
    }

    /// State the machine settles in for this outcome
    pub fn terminal_state(&self) -> GenerationState {
        if self.is_success() {
            GenerationState::Succeeded
        } else {
            GenerationState::Failed
        }
    }
}

/// Lifecycle of the dispatcher
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GenerationState {
    #[default]
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

impl GenerationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GenerationState::Succeeded | GenerationState::Failed)
    }
}
