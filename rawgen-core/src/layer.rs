//! Layer trait and abstractions.
//!
//! Layers wrap a transport with cross-cutting concerns such as logging or
//! deadlines. Each layer takes the inner transport and returns a new one.

use crate::transport::Transport;

/// Layer trait for wrapping transports.
pub trait Layer<T: Transport> {
    /// The type of the layered transport
    type LayeredTransport: Transport;

    /// Wrap the inner transport with this layer
    fn layer(&self, inner: T) -> Self::LayeredTransport;
}
