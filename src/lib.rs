//! Recruiter search assistant: turns plain-language hiring needs into
//! recruiter search queries, fills them into the host page and ranks the
//! candidates it lists, using an OpenAI-compatible chat completion service.

pub mod background;
pub mod bus;
pub mod config;
pub mod core;
pub mod error;
pub mod page;
pub mod types;
pub mod ui;
pub mod utils;
pub mod web;

pub use background::Background;
pub use bus::{ExtensionBus, MessageBus};
pub use config::PluginConfig;
pub use error::{AssistantError, AssistantResult};
pub use types::{Envelope, Message};
pub use web::start_web_server;
