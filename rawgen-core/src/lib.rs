//! # rawgen core
//!
//! Core abstractions and dispatch runtime for sending a single raw prompt to
//! one of several text-generation backends.
//!
//! This crate provides the backend adapter trait and registry, the transport
//! abstraction, response extraction helpers and the dispatcher that ties
//! them to a generation state machine.

pub mod adapter;
pub mod error;
pub mod extract;
pub mod host;
pub mod layer;
pub mod registry;
pub mod runtime;
pub mod settings;
pub mod state;
pub mod transport;
pub mod types;

// Re-exports
pub use adapter::BackendAdapter;
pub use error::GenError;
pub use host::{HostRuntime, Output, OutputSink, StaticHost, TracingSink};
pub use layer::Layer;
pub use registry::BackendRegistry;
pub use runtime::{Dispatcher, DispatcherBuilder};
pub use settings::{ApiMode, GeneratorSettings, MemorySettingsStore, SettingsStore};
pub use state::StateMachine;
pub use transport::{HttpTransport, Transport};
pub use types::*;

pub use tokio_util::sync::CancellationToken;

/// Result type alias for generation operations
pub type Result<T> = std::result::Result<T, GenError>;
