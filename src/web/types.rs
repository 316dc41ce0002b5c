// src/web/types.rs
use rocket::form::FromForm;
use rocket::serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::bus::ExtensionBus;
use crate::core::ConfigManager;
use crate::page::PageSelectors;
use crate::types::Envelope;
use crate::ui::{ConfigDraft, Popup};

/// Everything the routes share.
pub struct ServerState {
    pub bus: ExtensionBus,
    pub selectors: Arc<PageSelectors>,
    pub settings: ConfigManager,
    pub popup: Mutex<Popup>,
}

/// A page-bound message, optionally with a fresh snapshot of the page to
/// open as the active tab first.
#[derive(Debug, Deserialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct PageMessageRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    pub message: Value,
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct PageMessageResponse {
    #[serde(flatten)]
    pub envelope: Envelope,
    /// Page markup after the message was handled. Typed form values are not
    /// part of the markup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct NavigateRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, FromForm)]
pub struct OptimizerForm {
    pub action: String,
    #[field(name = "userInput")]
    pub user_input: Option<String>,
    #[field(name = "jobDescription")]
    pub job_description: Option<String>,
}

#[derive(Debug, FromForm)]
pub struct RankerForm {
    #[field(name = "jobDescription")]
    pub job_description: Option<String>,
}

#[derive(Debug, FromForm)]
pub struct ConfigForm {
    pub action: String,
    #[field(name = "apiKey")]
    pub api_key: Option<String>,
    #[field(name = "baseUrl")]
    pub base_url: Option<String>,
    #[field(name = "defaultModel")]
    pub default_model: Option<String>,
    pub temperature: Option<f64>,
    #[field(name = "enableAutoOptimization")]
    pub enable_auto_optimization: bool,
    #[field(name = "enableSmartRanking")]
    pub enable_smart_ranking: bool,
}

impl ConfigForm {
    /// Unchecked checkboxes are absent from the form, so both flags are always set.
    pub fn to_draft(&self) -> ConfigDraft {
        ConfigDraft {
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            default_model: self.default_model.clone(),
            temperature: self.temperature,
            enable_auto_optimization: Some(self.enable_auto_optimization),
            enable_smart_ranking: Some(self.enable_smart_ranking),
        }
    }
}
