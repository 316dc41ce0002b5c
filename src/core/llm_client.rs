// src/core/llm_client.rs
//! Chat-completion client: one POST per request, no retries, no streaming.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::PluginConfig;
use crate::core::prompts;
use crate::error::{AssistantError, AssistantResult};
use crate::types::{CandidateProfile, RankedCandidate, RankingEntry};
use crate::utils;

const CHAT_COMPLETIONS_ENDPOINT: &str = "/chat/completions";

pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const MAX_TOKENS: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmResponse {
    pub content: String,
    pub usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ChatCompletionChoice {
    message: ChatMessage,
}

/// Transport for a single chat-completion call.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, request: &ChatCompletionRequest) -> AssistantResult<LlmResponse>;
}

/// Builds a backend for the credentials in the current config.
pub trait BackendFactory: Send + Sync {
    fn connect(&self, config: &PluginConfig) -> AssistantResult<Arc<dyn ChatBackend>>;
}

pub struct HttpChatBackend {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpChatBackend {
    pub fn new(base_url: &str, api_key: &str) -> AssistantResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("recruiter-assistant/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                error!("Failed to create HTTP client: {}", e);
                AssistantError::external(e.to_string())
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, CHAT_COMPLETIONS_ENDPOINT)
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn complete(&self, request: &ChatCompletionRequest) -> AssistantResult<LlmResponse> {
        let url = self.endpoint();
        debug!("Calling chat completion endpoint: {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!("Chat completion request to {} failed: {}", url, e);
                AssistantError::external(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Chat completion returned {}: {}", status, error_text);
            return Err(AssistantError::external(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body: ChatCompletionResponse = response.json().await.map_err(|e| {
            error!("Failed to decode chat completion response: {}", e);
            AssistantError::external(e.to_string())
        })?;

        let usage = body.usage;
        let content = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                error!("Chat completion response carried no choices");
                AssistantError::external("response carried no choices")
            })?;

        Ok(LlmResponse { content, usage })
    }
}

pub struct HttpBackendFactory;

impl BackendFactory for HttpBackendFactory {
    fn connect(&self, config: &PluginConfig) -> AssistantResult<Arc<dyn ChatBackend>> {
        Ok(Arc::new(HttpChatBackend::new(
            &config.base_url,
            &config.api_key,
        )?))
    }
}

/// Prompt shaping on top of a `ChatBackend`.
pub struct LlmService {
    backend: Arc<dyn ChatBackend>,
    default_model: String,
    temperature: f64,
}

impl LlmService {
    pub fn new(backend: Arc<dyn ChatBackend>, default_model: impl Into<String>) -> Self {
        Self {
            backend,
            default_model: default_model.into(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn from_config(backend: Arc<dyn ChatBackend>, config: &PluginConfig) -> Self {
        Self::new(backend, config.default_model.clone()).with_temperature(config.temperature)
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub async fn generate_response(
        &self,
        prompt: &str,
        model: Option<&str>,
        temperature: Option<f64>,
    ) -> AssistantResult<LlmResponse> {
        let request = ChatCompletionRequest {
            model: model.unwrap_or(&self.default_model).to_string(),
            messages: vec![
                ChatMessage::system(prompts::SYSTEM_PROMPT),
                ChatMessage::user(prompt),
            ],
            temperature: temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: MAX_TOKENS,
        };

        let response = self.backend.complete(&request).await?;

        if let Some(usage) = &response.usage {
            debug!(
                "LLM call used {} prompt + {} completion tokens",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        Ok(response)
    }

    /// Returns the model's raw text; callers must cope with non-JSON content.
    pub async fn optimize_search_query(
        &self,
        user_input: &str,
        job_description: Option<&str>,
    ) -> AssistantResult<String> {
        let prompt = prompts::optimize_search_prompt(user_input, job_description);
        let response = self
            .generate_response(&prompt, None, Some(self.temperature))
            .await?;

        info!("Search query optimized ({} chars)", response.content.len());
        Ok(response.content)
    }

    /// Unparseable model output degrades to a neutral score for every candidate.
    pub async fn rank_candidates(
        &self,
        candidates: &[CandidateProfile],
        job_description: &str,
    ) -> AssistantResult<Vec<RankedCandidate>> {
        let candidates_json = serde_json::to_string_pretty(candidates)?;
        let prompt = prompts::rank_candidates_prompt(job_description, &candidates_json);
        let response = self
            .generate_response(&prompt, None, Some(self.temperature))
            .await?;

        match parse_rankings(&response.content, candidates) {
            Ok(ranked) => {
                info!("Ranked {} of {} candidates", ranked.len(), candidates.len());
                Ok(ranked)
            }
            Err(e) => {
                error!("Failed to parse candidate ranking: {}", e);
                Ok(default_rankings(candidates))
            }
        }
    }
}

/// Decode the model's ranking array and join each entry to its candidate by id.
pub fn parse_rankings(
    content: &str,
    candidates: &[CandidateProfile],
) -> AssistantResult<Vec<RankedCandidate>> {
    let entries: Vec<RankingEntry> = serde_json::from_str(utils::strip_code_fences(content))
        .map_err(|e| AssistantError::ResponseParse(format!("ranking: {}", e)))?;

    let mut by_id: HashMap<&str, &CandidateProfile> = HashMap::new();
    for candidate in candidates {
        by_id.entry(candidate.id.as_str()).or_insert(candidate);
    }

    Ok(entries
        .into_iter()
        .filter_map(|entry| match by_id.get(entry.id.as_str()) {
            Some(profile) => Some(RankedCandidate::from_entry((*profile).clone(), entry)),
            None => {
                warn!("Model ranked unknown candidate id {}", entry.id);
                None
            }
        })
        .collect())
}

pub fn default_rankings(candidates: &[CandidateProfile]) -> Vec<RankedCandidate> {
    candidates
        .iter()
        .cloned()
        .map(RankedCandidate::fallback)
        .collect()
}
