//! # rawgen layers
//!
//! Built-in transport layers for rawgen.
//!
//! Currently implemented layers:
//! - `LoggingLayer`: Logs every outgoing call with timing information
//! - `TimeoutLayer`: Fails the call with a timeout error once a deadline passes
//!
//! ## Usage
//!
//! ```ignore
//! use rawgen_core::{Dispatcher, HttpTransport};
//! use rawgen_layer::{LoggingLayer, TimeoutLayer};
//!
//! let dispatcher = Dispatcher::builder(HttpTransport::new())
//!     .layer(TimeoutLayer::new(Duration::from_secs(60)))
//!     .layer(LoggingLayer::new())
//!     .host(host)
//!     .finish()?;
//! ```

pub mod logging;
pub mod timeout;

// Re-exports
pub use logging::LoggingLayer;
pub use timeout::TimeoutLayer;
