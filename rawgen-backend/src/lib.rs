//! # rawgen backends
//!
//! Adapter implementations for the backend families rawgen can talk to.

pub mod chat;
pub mod completion;
pub mod custom;

// Re-exports
pub use chat::ChatAdapter;
pub use completion::CompletionAdapter;
pub use custom::CustomAdapter;

use rawgen_core::registry::BackendRegistry;
use rawgen_core::types::Payload;
use secrecy::{ExposeSecret, SecretString};

/// Registry with every built-in adapter.
///
/// Completion and chat adapters share the host's OpenAI-compatible base URL;
/// the custom adapter takes its endpoint from each request.
///
/// # Example
///
/// ```ignore
/// use rawgen_backend::default_registry;
///
/// let registry = default_registry("http://127.0.0.1:5000/v1");
/// ```
pub fn default_registry(base_url: impl Into<String>) -> BackendRegistry {
    let base_url = base_url.into();
    BackendRegistry::new()
        .with(CompletionAdapter::new(base_url.clone()))
        .with(ChatAdapter::new(base_url))
        .with(CustomAdapter::new())
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{}/{}", base, path)
}

/// Attach the credential as a bearer token, if there is one
pub(crate) fn authorize(payload: Payload, credential: Option<&SecretString>) -> Payload {
    match credential {
        Some(key) if !key.expose_secret().trim().is_empty() => payload.with_header(
            "Authorization",
            format!("Bearer {}", key.expose_secret().trim()),
        ),
        _ => payload,
    }
}
