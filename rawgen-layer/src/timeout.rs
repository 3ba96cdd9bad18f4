//! Timeout layer for transport calls.
//!
//! Bounds how long a single call may take. There is no retry: when the
//! deadline passes the in-flight call is dropped and the submission fails
//! with a timeout.

use async_trait::async_trait;
use rawgen_core::error::GenError;
use rawgen_core::layer::Layer;
use rawgen_core::transport::Transport;
use rawgen_core::types::*;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Timeout layer configuration
#[derive(Debug, Clone, Copy)]
pub struct TimeoutLayer {
    duration: Duration,
}

impl TimeoutLayer {
    /// Create a timeout layer with the given deadline
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl Default for TimeoutLayer {
    fn default() -> Self {
        Self::new(Duration::from_secs(120))
    }
}

impl<T: Transport> Layer<T> for TimeoutLayer {
    type LayeredTransport = TimeoutTransport<T>;

    fn layer(&self, inner: T) -> Self::LayeredTransport {
        TimeoutTransport {
            inner,
            duration: self.duration,
        }
    }
}

/// Transport wrapped with a deadline
#[derive(Debug)]
pub struct TimeoutTransport<T> {
    inner: T,
    duration: Duration,
}

#[async_trait]
impl<T: Transport> Transport for TimeoutTransport<T> {
    async fn send(
        &self,
        payload: Payload,
        cancel: &CancellationToken,
    ) -> Result<ResponseBody, GenError> {
        match tokio::time::timeout(self.duration, self.inner.send(payload, cancel)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("request timed out after {:?}", self.duration);
                Err(GenError::timeout(format!(
                    "no response within {:?}",
                    self.duration
                )))
            }
        }
    }
}
