//! Collaborators supplied by the embedding application.

use crate::types::{BackendId, GenerationParams};
use std::collections::HashMap;
use std::fmt::Debug;
use tokio_util::sync::CancellationToken;

/// Ambient state owned by the host application.
pub trait HostRuntime: Send + Sync + Debug + 'static {
    /// Headers attached to every outgoing request (auth, anti-forgery tokens)
    fn ambient_headers(&self) -> HashMap<String, String>;

    /// Backend the host is currently configured to talk to
    fn current_backend(&self) -> BackendId;

    /// Default generation parameters
    fn generation_params(&self) -> GenerationParams;

    /// Token the host fires to abandon the generation about to start.
    ///
    /// Called once per accepted submission.
    fn cancellation_token(&self) -> CancellationToken;

    /// Turn generated text into display markup
    fn format(&self, text: &str) -> String;
}

/// What the output surface should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// A generation is running
    Progress,
    /// Formatted generated text
    Markup(String),
    /// Informational statement, not an error
    Notice(String),
    /// Input problem the user can fix
    Warning(String),
    /// The generation failed
    Error(String),
}

/// The single designated output surface.
pub trait OutputSink: Send + Sync + Debug + 'static {
    /// Toggle the busy affordance: submission disabled and progress indicator shown
    fn set_busy(&self, busy: bool);

    /// Replace what the surface shows
    fn render(&self, output: Output);
}

/// Host with fixed values, for headless use and tests.
#[derive(Debug, Clone)]
pub struct StaticHost {
    backend: BackendId,
    params: GenerationParams,
    headers: HashMap<String, String>,
    cancel: Option<CancellationToken>,
}

impl StaticHost {
    pub fn new(backend: BackendId) -> Self {
        Self {
            backend,
            params: GenerationParams::default(),
            headers: HashMap::new(),
            cancel: None,
        }
    }

    /// Set the default generation parameters
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Add an ambient header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Hand out this token for every generation instead of a fresh one
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

impl HostRuntime for StaticHost {
    fn ambient_headers(&self) -> HashMap<String, String> {
        self.headers.clone()
    }

    fn current_backend(&self) -> BackendId {
        self.backend
    }

    fn generation_params(&self) -> GenerationParams {
        self.params.clone()
    }

    fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone().unwrap_or_else(CancellationToken::new)
    }

    fn format(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Sink that discards everything but logs what it would have shown.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl OutputSink for TracingSink {
    fn set_busy(&self, busy: bool) {
        tracing::trace!(busy, "busy affordance");
    }

    fn render(&self, output: Output) {
        match output {
            Output::Progress => tracing::debug!("generating"),
            Output::Markup(markup) => tracing::info!("{}", markup),
            Output::Notice(text) => tracing::info!("{}", text),
            Output::Warning(text) => tracing::warn!("{}", text),
            Output::Error(text) => tracing::error!("{}", text),
        }
    }
}
