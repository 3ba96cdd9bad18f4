//! Logging layer for transport calls.

use async_trait::async_trait;
use rawgen_core::error::GenError;
use rawgen_core::layer::Layer;
use rawgen_core::transport::Transport;
use rawgen_core::types::*;
use std::fmt::Debug;
use tokio_util::sync::CancellationToken;

/// Logging layer that logs transport calls.
#[derive(Debug, Clone)]
pub struct LoggingLayer {
    prefix: String,
}

impl LoggingLayer {
    /// Create a new logging layer
    pub fn new() -> Self {
        Self {
            prefix: "[rawgen]".to_string(),
        }
    }

    /// Create a logging layer with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LoggingLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> Layer<T> for LoggingLayer {
    type LayeredTransport = LoggingTransport<T>;

    fn layer(&self, inner: T) -> Self::LayeredTransport {
        LoggingTransport {
            inner,
            prefix: self.prefix.clone(),
        }
    }
}

/// Transport wrapped with logging
#[derive(Debug)]
pub struct LoggingTransport<T> {
    inner: T,
    prefix: String,
}

#[async_trait]
impl<T: Transport> Transport for LoggingTransport<T> {
    async fn send(
        &self,
        payload: Payload,
        cancel: &CancellationToken,
    ) -> Result<ResponseBody, GenError> {
        // Header values can carry credentials; only names are logged.
        let header_names: Vec<&str> = payload.headers.keys().map(String::as_str).collect();
        tracing::debug!(
            "{} send request: endpoint={}, headers={:?}",
            self.prefix,
            payload.endpoint,
            header_names
        );
        let endpoint = payload.endpoint.clone();

        let start = std::time::Instant::now();
        let result = self.inner.send(payload, cancel).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(ResponseBody::Json(_)) => {
                tracing::debug!(
                    "{} send success: endpoint={}, body=json, elapsed={:?}",
                    self.prefix,
                    endpoint,
                    elapsed
                );
            }
            Ok(ResponseBody::Text(text)) => {
                tracing::debug!(
                    "{} send success: endpoint={}, body=text({} bytes), elapsed={:?}",
                    self.prefix,
                    endpoint,
                    text.len(),
                    elapsed
                );
            }
            Err(GenError::Cancelled) => {
                tracing::info!(
                    "{} send cancelled: endpoint={}, elapsed={:?}",
                    self.prefix,
                    endpoint,
                    elapsed
                );
            }
            Err(e) => {
                tracing::error!(
                    "{} send error: endpoint={}, {}, elapsed={:?}",
                    self.prefix,
                    endpoint,
                    e,
                    elapsed
                );
            }
        }

        result
    }
}
