// src/core/config_manager.rs
//! Process-level settings: where state lives, how the server listens and
//! which host pages the page adapter targets.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::page::selectors::{PageSelectors, SelectorOverrides};

pub const DEFAULT_STORE_PATH: &str = "data/assistant_store.json";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 2000;

#[derive(Debug, Clone)]
pub struct ConfigManager {
    pub store_path: PathBuf,
    pub port: u16,
    pub settle_delay: Duration,
    pub selectors_path: Option<PathBuf>,
    pub host: HostPageMatcher,
}

/// Identifies the recruiter search page among arbitrary tab URLs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HostPageMatcher {
    pub domain: String,
    pub path: String,
}

impl Default for HostPageMatcher {
    fn default() -> Self {
        Self {
            domain: "linkedin.com".to_string(),
            path: "/recruiter".to_string(),
        }
    }
}

impl HostPageMatcher {
    pub fn matches(&self, url: &str) -> bool {
        url.contains(&format!("{}{}", self.domain, self.path))
    }

    /// Looser check used inside the page, where only the path is reliable.
    pub fn matches_path(&self, url: &str) -> bool {
        url.contains(&format!("{}/", self.path.trim_end_matches('/')))
            || url.ends_with(&self.path)
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            port: DEFAULT_PORT,
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
            selectors_path: None,
            host: HostPageMatcher::default(),
        }
    }
}

impl ConfigManager {
    /// Load settings from the environment, falling back to defaults
    pub fn load() -> Result<Self> {
        let defaults = Self::default();

        let store_path = std::env::var("ASSISTANT_STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.store_path);

        let port = match std::env::var("ROCKET_PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .context("ROCKET_PORT must be a valid port number")?,
            Err(_) => defaults.port,
        };

        let settle_delay = match std::env::var("ASSISTANT_SETTLE_DELAY_MS") {
            Ok(raw) => Duration::from_millis(
                raw.parse::<u64>()
                    .context("ASSISTANT_SETTLE_DELAY_MS must be a number of milliseconds")?,
            ),
            Err(_) => defaults.settle_delay,
        };

        let selectors_path = std::env::var("ASSISTANT_SELECTORS_PATH")
            .ok()
            .map(PathBuf::from);

        let host = HostPageMatcher {
            domain: std::env::var("ASSISTANT_HOST_DOMAIN").unwrap_or(defaults.host.domain),
            path: std::env::var("ASSISTANT_HOST_PATH").unwrap_or(defaults.host.path),
        };

        info!("Loaded settings, store: {}", store_path.display());

        Ok(Self {
            store_path,
            port,
            settle_delay,
            selectors_path,
            host,
        })
    }

    /// Default selector chains, with per-chain overrides from the TOML file if one is set
    pub fn load_selectors(&self) -> Result<PageSelectors> {
        let Some(path) = &self.selectors_path else {
            return Ok(PageSelectors::default());
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read selector file: {}", path.display()))?;
        let overrides: SelectorOverrides = toml::from_str(&content)
            .with_context(|| format!("Failed to parse selector file: {}", path.display()))?;

        info!("Loaded selector overrides from {}", path.display());
        Ok(PageSelectors::default().with_overrides(&overrides))
    }
}
