//! Generator settings and the store they live in.

use arc_swap::ArcSwap;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

pub const API_MODE_KEY: &str = "rawgen.api_mode";
pub const CUSTOM_API_URL_KEY: &str = "rawgen.custom_api_url";
pub const CUSTOM_API_KEY_KEY: &str = "rawgen.custom_api_key";

/// Opaque key/value configuration persisted by the host.
pub trait SettingsStore: Send + Sync + Debug + 'static {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: String);
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: ArcSwap<HashMap<String, String>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, value.into());
        self
    }

    /// Current contents
    pub fn snapshot(&self) -> Arc<HashMap<String, String>> {
        self.values.load_full()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.load().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.values.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.insert(key.to_string(), value.clone());
            next
        });
    }
}

/// Which backend a submission goes to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ApiMode {
    /// Whatever backend the host is currently using
    #[default]
    Host,
    /// The user-configured custom endpoint
    Custom,
}

impl ApiMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiMode::Host => "host",
            ApiMode::Custom => "custom",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "host" => Some(ApiMode::Host),
            "custom" => Some(ApiMode::Custom),
            _ => None,
        }
    }
}

/// Typed view over the generator's keys in a `SettingsStore`.
#[derive(Debug, Default)]
pub struct GeneratorSettings {
    pub api_mode: ApiMode,
    pub custom_api_url: String,
    pub custom_api_key: Option<SecretString>,
}

impl GeneratorSettings {
    /// Load from a store, filling anything missing with defaults.
    pub fn load(store: &dyn SettingsStore) -> Self {
        let api_mode = match store.get(API_MODE_KEY) {
            Some(raw) => ApiMode::parse(&raw).unwrap_or_else(|| {
                tracing::warn!("unknown api mode {:?}, using default", raw);
                ApiMode::default()
            }),
            None => ApiMode::default(),
        };

        let custom_api_url = store
            .get(CUSTOM_API_URL_KEY)
            .map(|url| url.trim().to_string())
            .unwrap_or_default();

        let custom_api_key = store
            .get(CUSTOM_API_KEY_KEY)
            .filter(|key| !key.is_empty())
            .map(SecretString::from);

        tracing::debug!(mode = api_mode.as_str(), "settings loaded");

        Self {
            api_mode,
            custom_api_url,
            custom_api_key,
        }
    }

    /// Write every key back to the store.
    pub fn save(&self, store: &dyn SettingsStore) {
        store.set(API_MODE_KEY, self.api_mode.as_str().to_string());
        store.set(CUSTOM_API_URL_KEY, self.custom_api_url.trim().to_string());
        let key = self
            .custom_api_key
            .as_ref()
            .map(|k| k.expose_secret().to_string())
            .unwrap_or_default();
        store.set(CUSTOM_API_KEY_KEY, key);
        tracing::debug!(mode = self.api_mode.as_str(), "settings saved");
    }
}
