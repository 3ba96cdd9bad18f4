//! Runtime layer for rawgen.
//!
//! The runtime sits between the single public operation (`submit`) and the
//! backend adapters and transport. It is responsible for:
//! - Validating the prompt and selecting the backend from settings and host
//! - Enforcing the single-in-flight rule through the state machine
//! - Building, sending and extracting through the selected adapter
//! - Classifying the outcome and rendering it to the output sink

pub mod dispatcher;

pub use dispatcher::{Dispatcher, DispatcherBuilder};
