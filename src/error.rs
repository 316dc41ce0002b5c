// src/error.rs
//! Error taxonomy shared by every message handler.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("No API key configured. Open the settings tab and enter your API key first")]
    ConfigurationMissing,

    /// The detail is for logs only; the envelope carries the generic text.
    #[error("The LLM service is temporarily unavailable, please retry later")]
    ExternalService { detail: String },

    #[error("Could not parse model output: {0}")]
    ResponseParse(String),

    #[error("Page element not found: {0}. The page may not be ready, refresh it and retry")]
    ElementNotFound(String),

    #[error("Unrecognized request type: {0}")]
    UnknownRequestType(String),

    #[error("Invalid payload for {kind}: {reason}")]
    InvalidPayload { kind: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl AssistantError {
    pub fn external(detail: impl Into<String>) -> Self {
        Self::ExternalService {
            detail: detail.into(),
        }
    }

    pub fn invalid_payload(kind: &str, reason: impl ToString) -> Self {
        Self::InvalidPayload {
            kind: kind.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Stable machine-readable code placed next to the message in envelopes.
    pub fn error_code(&self) -> &'static str {
        match self {
            AssistantError::ConfigurationMissing => "CONFIGURATION_MISSING",
            AssistantError::ExternalService { .. } => "SERVICE_UNAVAILABLE",
            AssistantError::ResponseParse(_) => "RESPONSE_PARSE_ERROR",
            AssistantError::ElementNotFound(_) => "ELEMENT_NOT_FOUND",
            AssistantError::UnknownRequestType(_) => "UNKNOWN_REQUEST_TYPE",
            AssistantError::InvalidPayload { .. } => "INVALID_PAYLOAD",
            AssistantError::InvalidConfig(_) => "INVALID_CONFIG",
            AssistantError::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl From<serde_json::Error> for AssistantError {
    fn from(e: serde_json::Error) -> Self {
        AssistantError::ResponseParse(e.to_string())
    }
}

pub type AssistantResult<T> = Result<T, AssistantError>;
