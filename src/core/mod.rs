// src/core/mod.rs
//! Core services shared by the background, the page adapter and the server

pub mod config_manager;
pub mod config_store;
pub mod llm_client;
pub mod prompts;

pub use config_manager::{ConfigManager, HostPageMatcher};
pub use config_store::{ConfigStore, JsonFileStore, KeyValueStore, MemoryStore};
pub use llm_client::{BackendFactory, ChatBackend, HttpBackendFactory, LlmService};
