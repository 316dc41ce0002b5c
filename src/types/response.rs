// src/types/response.rs
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AssistantError;

/// Uniform `{success, data|error, message?}` wrapper returned across every
/// context boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Envelope {
    pub fn success<T: Serialize>(message: impl Into<String>, data: T) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Self {
                success: true,
                data: Some(data),
                error: None,
                error_code: None,
                message: Some(message.into()),
            },
            Err(e) => Self::failure(&AssistantError::from(e)),
        }
    }

    pub fn ack(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            error_code: None,
            message: Some(message.into()),
        }
    }

    pub fn failure(error: &AssistantError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
            error_code: Some(error.error_code().to_string()),
            message: None,
        }
    }

    /// Decode `data` into a typed payload, `None` when absent or mismatched.
    pub fn data_as<T: DeserializeOwned>(&self) -> Option<T> {
        self.data
            .clone()
            .and_then(|data| serde_json::from_value(data).ok())
    }

    pub fn error_text(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

impl From<Result<Envelope, AssistantError>> for Envelope {
    fn from(result: Result<Envelope, AssistantError>) -> Self {
        result.unwrap_or_else(|e| Envelope::failure(&e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failure_envelope_shape() {
        let envelope = Envelope::failure(&AssistantError::ConfigurationMissing);
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["errorCode"], "CONFIGURATION_MISSING");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_success_envelope_roundtrips_data() {
        let envelope = Envelope::success("done", json!({"candidateCount": 2}));
        assert!(envelope.success);
        let data: Value = envelope.data_as().unwrap();
        assert_eq!(data["candidateCount"], 2);
    }
}
