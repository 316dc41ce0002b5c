// src/types/message.rs
//! Typed request messages exchanged between the popup, the background
//! coordinator and the page adapter. On the wire a message is
//! `{"type": "OPTIMIZE_SEARCH", "data": {...}}`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AssistantError, AssistantResult};
use crate::types::{CandidateProfile, RankedCandidate};

pub const OPTIMIZE_SEARCH: &str = "OPTIMIZE_SEARCH";
pub const RANK_CANDIDATES: &str = "RANK_CANDIDATES";
pub const GET_CONFIG: &str = "GET_CONFIG";
pub const UPDATE_CONFIG: &str = "UPDATE_CONFIG";
pub const APPLY_OPTIMIZED_QUERY: &str = "APPLY_OPTIMIZED_QUERY";
pub const PAGE_LOADED: &str = "PAGE_LOADED";
pub const GET_CANDIDATES: &str = "GET_CANDIDATES";

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    OptimizeSearch(OptimizeSearchRequest),
    RankCandidates(RankCandidatesRequest),
    GetConfig,
    /// Partial or full `PluginConfig` object.
    UpdateConfig(Value),
    ApplyOptimizedQuery(ApplyQueryRequest),
    PageLoaded(PageLoadedRequest),
    GetCandidates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeSearchRequest {
    pub user_input: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankCandidatesRequest {
    pub candidates: Vec<CandidateProfile>,
    pub job_description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyQueryRequest {
    pub optimized_query: String,
    /// Decode the text as the optimizer's JSON and fill each filter.
    #[serde(default)]
    pub structured: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLoadedRequest {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeSearchData {
    pub user_input: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_description: Option<String>,
    pub optimized_query: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankCandidatesData {
    pub candidate_count: usize,
    pub job_description: String,
    pub ranked_candidates: Vec<RankedCandidate>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatesData {
    pub candidates: Vec<CandidateProfile>,
    pub job_description: String,
}

fn decode<T: DeserializeOwned>(kind: &str, data: Value) -> AssistantResult<T> {
    serde_json::from_value(data).map_err(|e| AssistantError::invalid_payload(kind, e))
}

fn encode<T: Serialize>(payload: &T) -> Value {
    serde_json::to_value(payload).unwrap_or(Value::Null)
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Message::OptimizeSearch(_) => OPTIMIZE_SEARCH,
            Message::RankCandidates(_) => RANK_CANDIDATES,
            Message::GetConfig => GET_CONFIG,
            Message::UpdateConfig(_) => UPDATE_CONFIG,
            Message::ApplyOptimizedQuery(_) => APPLY_OPTIMIZED_QUERY,
            Message::PageLoaded(_) => PAGE_LOADED,
            Message::GetCandidates => GET_CANDIDATES,
        }
    }

    pub fn from_value(value: Value) -> AssistantResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| AssistantError::invalid_payload("message", "expected a JSON object"))?;

        let kind = object
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| AssistantError::invalid_payload("message", "missing \"type\" field"))?;

        let data = object.get("data").cloned().unwrap_or(Value::Null);

        match kind {
            OPTIMIZE_SEARCH => Ok(Message::OptimizeSearch(decode(kind, data)?)),
            RANK_CANDIDATES => Ok(Message::RankCandidates(decode(kind, data)?)),
            GET_CONFIG => Ok(Message::GetConfig),
            UPDATE_CONFIG => {
                if !data.is_object() {
                    return Err(AssistantError::invalid_payload(
                        kind,
                        "expected a configuration object",
                    ));
                }
                Ok(Message::UpdateConfig(data))
            }
            APPLY_OPTIMIZED_QUERY => Ok(Message::ApplyOptimizedQuery(decode(kind, data)?)),
            PAGE_LOADED => Ok(Message::PageLoaded(decode(kind, data)?)),
            GET_CANDIDATES => Ok(Message::GetCandidates),
            other => Err(AssistantError::UnknownRequestType(other.to_string())),
        }
    }

    pub fn to_value(&self) -> Value {
        let data = match self {
            Message::OptimizeSearch(payload) => encode(payload),
            Message::RankCandidates(payload) => encode(payload),
            Message::UpdateConfig(payload) => payload.clone(),
            Message::ApplyOptimizedQuery(payload) => encode(payload),
            Message::PageLoaded(payload) => encode(payload),
            Message::GetConfig | Message::GetCandidates => Value::Null,
        };

        if data.is_null() {
            json!({ "type": self.kind() })
        } else {
            json!({ "type": self.kind(), "data": data })
        }
    }
}
