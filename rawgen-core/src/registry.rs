//! Backend registry.

use crate::adapter::BackendAdapter;
use crate::error::GenError;
use crate::types::BackendId;
use dashmap::DashMap;
use std::sync::Arc;

/// Maps a backend identifier to its adapter.
#[derive(Debug, Clone, Default)]
pub struct BackendRegistry {
    adapters: Arc<DashMap<BackendId, Arc<dyn BackendAdapter>>>,
}

impl BackendRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own backend id, replacing any previous one
    pub fn register(&self, adapter: Arc<dyn BackendAdapter>) -> Option<Arc<dyn BackendAdapter>> {
        let backend = adapter.backend();
        tracing::debug!("registering adapter for backend {}", backend);
        self.adapters.insert(backend, adapter)
    }

    /// Builder-style registration
    pub fn with(self, adapter: impl BackendAdapter) -> Self {
        self.register(Arc::new(adapter));
        self
    }

    /// Resolve the adapter for a backend
    pub fn lookup(&self, backend: BackendId) -> Result<Arc<dyn BackendAdapter>, GenError> {
        self.adapters
            .get(&backend)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| GenError::from(backend))
    }

    pub fn contains(&self, backend: BackendId) -> bool {
        self.adapters.contains_key(&backend)
    }

    /// Registered backends, in no particular order
    pub fn backends(&self) -> Vec<BackendId> {
        self.adapters.iter().map(|entry| *entry.key()).collect()
    }
}
