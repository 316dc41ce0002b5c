// src/core/config_store.rs
//! Persistence of the plugin settings through a key-value storage facility.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::PluginConfig;
use crate::error::{AssistantError, AssistantResult};

/// Key under which the whole `PluginConfig` object is stored.
pub const CONFIG_KEY: &str = "pluginConfig";

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> AssistantResult<Option<Value>>;
    async fn set(&self, key: &str, value: Value) -> AssistantResult<()>;
}

/// Keeps entries in process memory; nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> AssistantResult<Option<Value>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> AssistantResult<()> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// Stores all entries as one JSON object in a file, rewritten on every `set`.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> AssistantResult<Map<String, Value>> {
        if fs::metadata(&self.path).await.is_err() {
            return Ok(Map::new());
        }

        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            AssistantError::Storage(format!("Failed to read {}: {}", self.path.display(), e))
        })?;

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(AssistantError::Storage(format!(
                "{} does not hold a JSON object",
                self.path.display()
            ))),
            Err(e) => Err(AssistantError::Storage(format!(
                "Failed to parse {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> AssistantResult<Option<Value>> {
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> AssistantResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut entries = match self.read_all().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Overwriting unreadable store: {}", e);
                Map::new()
            }
        };
        entries.insert(key.to_string(), value);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| {
                AssistantError::Storage(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let content = serde_json::to_string_pretty(&Value::Object(entries))
            .map_err(|e| AssistantError::Storage(e.to_string()))?;

        fs::write(&self.path, content).await.map_err(|e| {
            AssistantError::Storage(format!("Failed to write {}: {}", self.path.display(), e))
        })?;

        debug!("Persisted key {} to {}", key, self.path.display());
        Ok(())
    }
}

/// Load/save lifecycle for `PluginConfig`. Last write wins.
#[derive(Clone)]
pub struct ConfigStore {
    backend: Arc<dyn KeyValueStore>,
    defaults: PluginConfig,
}

impl ConfigStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            defaults: PluginConfig::default(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn with_defaults(mut self, defaults: PluginConfig) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn defaults(&self) -> &PluginConfig {
        &self.defaults
    }

    /// Stored fields win, absent ones fall back to the compiled-in defaults.
    pub async fn load(&self) -> AssistantResult<PluginConfig> {
        match self.backend.get(CONFIG_KEY).await? {
            Some(stored) => self.defaults.merged_with(&stored),
            None => {
                debug!("No stored config, using defaults");
                Ok(self.defaults.clone())
            }
        }
    }

    /// Replace the stored object with `config`.
    pub async fn save(&self, config: &PluginConfig) -> AssistantResult<()> {
        let value = serde_json::to_value(config)
            .map_err(|e| AssistantError::Storage(e.to_string()))?;
        self.backend.set(CONFIG_KEY, value).await
    }

    /// Merge a partial object over the current config, validate and persist it.
    pub async fn update(&self, partial: &Value) -> AssistantResult<PluginConfig> {
        let current = self.load().await?;
        let updated = current.merged_with(partial)?;
        updated.validate()?;
        self.save(&updated).await?;
        info!("Configuration updated");
        Ok(updated)
    }

    /// Seed defaults on first install, or over an unreadable store.
    /// Returns whether anything was written.
    pub async fn install_defaults(&self) -> AssistantResult<bool> {
        match self.backend.get(CONFIG_KEY).await {
            Ok(Some(_)) => return Ok(false),
            Ok(None) => {}
            Err(AssistantError::Storage(reason)) => {
                warn!("Stored configuration unreadable, reinstalling defaults: {}", reason);
            }
            Err(e) => return Err(e),
        }
        self.save(&self.defaults).await?;
        info!("Default configuration installed");
        Ok(true)
    }
}
