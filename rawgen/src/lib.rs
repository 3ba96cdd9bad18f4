//! # rawgen
//!
//! Send the text you typed, verbatim, to a text-generation backend and show
//! what comes back.
//!
//! A submission goes out as exactly one request. There is no chat history,
//! no system prompt and no character persona: the prompt is the whole input.
//! The outcome is always one of success, success without extractable text,
//! failure or cancellation, and the output surface is never left busy.
//!
//! ## Features
//!
//! - **Pluggable backends**: Completion, chat and user-supplied custom endpoints
//! - **Composable layers**: Wrap the transport with logging or a deadline
//! - **Single in-flight generation**: Concurrent submissions are rejected, not queued
//! - **Cooperative cancellation**: A late response after cancellation is discarded
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! rawgen = { version = "0.1", features = ["backends", "layers"] }
//! ```
//!
//! ```ignore
//! use rawgen::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let host = StaticHost::new(BackendId::Chat)
//!     .with_params(GenerationParams::default().with_model("gpt-4o-mini"));
//!
//! let dispatcher = Dispatcher::builder(HttpTransport::new())
//!     .layer(LoggingLayer::new())
//!     .registry(default_registry("http://127.0.0.1:5000/v1"))
//!     .host(Arc::new(host))
//!     .finish()?;
//!
//! match dispatcher.submit("Once upon a time").await? {
//!     GenerationResult::Succeeded { text } => println!("{}", text),
//!     other => println!("{:?}", other),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: Includes `backends` and `layers`
//! - `backends`: Completion, chat and custom endpoint adapters
//! - `layers`: Built-in layers (logging, timeout)
//! - `full`: All features enabled

// Re-export core types and traits
pub use rawgen_core::*;

// Re-export adapters under `backend` module
#[cfg(feature = "rawgen-backend")]
pub mod backend {
    //! Backend adapter implementations.
    pub use rawgen_backend::*;
}

// Re-export layers under `layer` module
#[cfg(feature = "rawgen-layer")]
pub mod layer {
    //! Built-in transport layers.
    pub use rawgen_layer::*;
}

/// Prelude module for convenient imports
pub mod prelude {
    //! Prelude module containing the most commonly used types and traits.
    //!
    //! ```
    //! use rawgen::prelude::*;
    //! ```

    pub use crate::{
        ApiMode, BackendAdapter, BackendId, BackendRegistry, CancellationToken, Dispatcher,
        GenError, GenerationParams, GenerationResult, GenerationState, GeneratorSettings,
        HostRuntime, HttpTransport, Layer, MemorySettingsStore, Output, OutputSink, Result,
        SettingsStore, StaticHost, Transport,
    };

    #[cfg(feature = "rawgen-backend")]
    pub use crate::backend::*;

    #[cfg(feature = "rawgen-layer")]
    pub use crate::layer::*;
}
