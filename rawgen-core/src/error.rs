//! Error types for generation dispatch.

use crate::types::{BackendId, FailureKind};

/// The main error type for generation operations.
#[derive(Debug, thiserror::Error)]
pub enum GenError {
    /// The request is malformed (empty prompt, blank custom endpoint)
    #[error("Validation error: {0}")]
    Validation(String),

    /// No adapter is registered for the backend
    #[error("Unsupported backend: {0}")]
    UnsupportedBackend(String),

    /// The backend answered with a non-2xx status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Request timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// A submission is already in flight
    #[error("A generation is already in progress")]
    Busy,

    /// The cancellation token fired while the call was outstanding
    #[error("Generation cancelled")]
    Cancelled,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl GenError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an unsupported backend error
    pub fn unsupported_backend(backend: impl Into<String>) -> Self {
        Self::UnsupportedBackend(backend.into())
    }

    /// Create an HTTP error
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Classify this error for a `GenerationResult::Failed`.
    ///
    /// `Busy` and `Cancelled` are not failures and have no kind.
    pub fn kind(&self) -> Option<FailureKind> {
        let kind = match self {
            GenError::Validation(_) | GenError::Configuration(_) => FailureKind::Validation,
            GenError::UnsupportedBackend(_) => FailureKind::UnsupportedBackend,
            GenError::Http { status, .. } => FailureKind::Http { status: *status },
            GenError::Network(_) => FailureKind::Network,
            GenError::Timeout(_) => FailureKind::Timeout,
            GenError::Serialization(_) => FailureKind::Serialization,
            GenError::Busy | GenError::Cancelled => return None,
        };
        Some(kind)
    }

    /// Message suitable for display, without the variant prefix.
    pub fn user_message(&self) -> String {
        match self {
            GenError::Validation(msg)
            | GenError::UnsupportedBackend(msg)
            | GenError::Timeout(msg)
            | GenError::Configuration(msg) => msg.clone(),
            GenError::Http { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<BackendId> for GenError {
    fn from(backend: BackendId) -> Self {
        Self::UnsupportedBackend(backend.to_string())
    }
}
