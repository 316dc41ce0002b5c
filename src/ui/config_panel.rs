// src/ui/config_panel.rs
use serde::Deserialize;
use tracing::{error, info};

use crate::bus::MessageBus;
use crate::config::PluginConfig;
use crate::types::{Envelope, Message};

/// Edits submitted from the settings form. Absent fields stay unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigDraft {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub default_model: Option<String>,
    pub temperature: Option<f64>,
    pub enable_auto_optimization: Option<bool>,
    pub enable_smart_ranking: Option<bool>,
}

/// Settings tab: shows the stored config, edits a copy, saves or discards it.
#[derive(Debug, Clone, Default)]
pub struct ConfigPanel {
    pub config: PluginConfig,
    pub draft: PluginConfig,
    pub editing: bool,
    pub loading: bool,
    pub error: Option<String>,
}

impl ConfigPanel {
    pub async fn load(&mut self, bus: &dyn MessageBus) {
        self.loading = true;
        let envelope = bus.send_runtime_message(Message::GetConfig).await;
        self.loading = false;

        match envelope.data_as::<PluginConfig>() {
            Some(config) => {
                self.draft = config.clone();
                self.config = config;
                self.error = None;
            }
            None => self.error = Some(failure_text(&envelope, "Failed to load settings")),
        }
    }

    pub fn begin_edit(&mut self) {
        self.draft = self.config.clone();
        self.editing = true;
    }

    pub fn apply_draft(&mut self, edits: &ConfigDraft) {
        if !self.editing {
            self.begin_edit();
        }
        if let Some(api_key) = &edits.api_key {
            self.draft.api_key = api_key.trim().to_string();
        }
        if let Some(base_url) = &edits.base_url {
            self.draft.base_url = base_url.trim().to_string();
        }
        if let Some(model) = &edits.default_model {
            self.draft.default_model = model.trim().to_string();
        }
        if let Some(temperature) = edits.temperature {
            self.draft.temperature = temperature;
        }
        if let Some(flag) = edits.enable_auto_optimization {
            self.draft.enable_auto_optimization = flag;
        }
        if let Some(flag) = edits.enable_smart_ranking {
            self.draft.enable_smart_ranking = flag;
        }
    }

    pub fn cancel(&mut self) {
        self.draft = self.config.clone();
        self.editing = false;
        self.error = None;
    }

    /// Persist the draft. On failure the panel stays in edit mode.
    pub async fn save(&mut self, bus: &dyn MessageBus) -> bool {
        let value = match serde_json::to_value(&self.draft) {
            Ok(value) => value,
            Err(e) => {
                error!("Failed to encode settings: {}", e);
                self.error = Some("Failed to save settings".to_string());
                return false;
            }
        };

        let envelope = bus.send_runtime_message(Message::UpdateConfig(value)).await;
        if envelope.success {
            info!("Settings saved from popup");
            self.config = self.draft.clone();
            self.editing = false;
            self.error = None;
            true
        } else {
            self.error = Some(failure_text(&envelope, "Failed to save settings"));
            false
        }
    }
}

pub(crate) fn failure_text(envelope: &Envelope, fallback: &str) -> String {
    envelope.error_text().unwrap_or(fallback).to_string()
}
