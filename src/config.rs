// src/config.rs
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{AssistantError, AssistantResult};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// User-editable settings persisted under a single storage key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PluginConfig {
    pub api_key: String,
    pub base_url: String,
    pub default_model: String,
    pub temperature: f64,
    pub enable_auto_optimization: bool,
    pub enable_smart_ranking: bool,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            enable_auto_optimization: true,
            enable_smart_ranking: true,
        }
    }
}

impl PluginConfig {
    pub fn has_credentials(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Overlay `stored` on top of `self`, field by field.
    ///
    /// Stored values whose JSON type differs from the current field's type are
    /// ignored, so one corrupt field never discards the rest.
    pub fn merged_with(&self, stored: &Value) -> AssistantResult<Self> {
        let mut merged = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        let Some(stored) = stored.as_object() else {
            warn!("Stored config is not an object, using defaults");
            return Ok(self.clone());
        };

        for (key, value) in stored {
            match merged.get(key) {
                Some(current) if same_json_kind(current, value) => {
                    merged.insert(key.clone(), value.clone());
                }
                Some(_) => warn!("Ignoring stored config field {} with unexpected type", key),
                None => warn!("Ignoring unknown stored config field {}", key),
            }
        }

        serde_json::from_value(Value::Object(merged))
            .map_err(|e| AssistantError::InvalidConfig(e.to_string()))
    }

    pub fn validate(&self) -> AssistantResult<()> {
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(AssistantError::InvalidConfig(format!(
                "temperature must be between 0 and 1, got {}",
                self.temperature
            )));
        }

        let url = Url::parse(&self.base_url).map_err(|e| {
            AssistantError::InvalidConfig(format!("base URL {:?} is not valid: {}", self.base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AssistantError::InvalidConfig(format!(
                "base URL must use http or https, got {}",
                url.scheme()
            )));
        }

        if self.default_model.trim().is_empty() {
            return Err(AssistantError::InvalidConfig(
                "default model must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

fn same_json_kind(a: &Value, b: &Value) -> bool {
    matches!(
        (a, b),
        (Value::String(_), Value::String(_))
            | (Value::Number(_), Value::Number(_))
            | (Value::Bool(_), Value::Bool(_))
    )
}
