use std::path::PathBuf;
use std::time::Duration;

use recall_index::{EmbedderConfig, IndexConfig};
use recall_store::StoreConfig;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Tunables for the memory service.
///
/// Every field has a usable default, so `ServiceConfig::default()` yields a
/// working local setup (files under `./memory`, deterministic embeddings).
/// Deployments that cannot ship a config file can layer environment
/// overrides on top with [`ServiceConfig::from_env`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// File store settings.
    pub store: StoreConfig,
    /// Embedder settings (model name, dimension, optional remote endpoint).
    pub embedder: EmbedderConfig,
    /// Index adapter settings.
    pub index: IndexConfig,
    /// Page size for `list` when the caller does not pass one.
    pub default_list_limit: usize,
    /// Result count for `search` when the caller does not pass one.
    pub default_top_k: usize,
    /// Ceiling on caller-requested search result counts.
    pub max_top_k: usize,
    /// Wall-clock budget for a single service operation, in milliseconds.
    pub op_timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            embedder: EmbedderConfig::default(),
            index: IndexConfig::default(),
            default_list_limit: 10,
            default_top_k: 3,
            max_top_k: 10,
            op_timeout_ms: 10_000,
        }
    }
}

impl ServiceConfig {
    /// Defaults plus `RECALL_*` environment overrides.
    ///
    /// Unparsable numeric values are logged and ignored rather than
    /// failing startup.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var("RECALL_MEMORY_DIR") {
            config.store.root_dir = PathBuf::from(dir);
        }
        if let Ok(model) = std::env::var("RECALL_EMBEDDING_MODEL") {
            config.embedder.model = model;
        }
        if let Ok(url) = std::env::var("RECALL_EMBEDDING_URL") {
            config.embedder.base_url = Some(url);
        }
        if let Ok(var_name) = std::env::var("RECALL_EMBEDDING_API_KEY_ENV") {
            config.embedder.api_key_env = Some(var_name);
        }
        if let Ok(raw) = std::env::var("RECALL_OP_TIMEOUT_MS") {
            match raw.parse() {
                Ok(ms) => config.op_timeout_ms = ms,
                Err(_) => warn!(value = %raw, "ignoring unparsable RECALL_OP_TIMEOUT_MS"),
            }
        }
        config
    }

    /// Wall-clock budget granted to each service operation.
    pub fn op_budget(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }
}
