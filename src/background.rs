// src/background.rs
//! Background request orchestrator. Routes typed messages to the config
//! store and the LLM service and answers every one with an `Envelope`.

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::core::config_manager::HostPageMatcher;
use crate::core::config_store::ConfigStore;
use crate::core::llm_client::{BackendFactory, LlmService};
use crate::error::{AssistantError, AssistantResult};
use crate::types::message::{
    OptimizeSearchData, OptimizeSearchRequest, PageLoadedRequest, RankCandidatesData,
    RankCandidatesRequest,
};
use crate::types::{Envelope, Message};
use crate::utils;

pub struct Background {
    store: ConfigStore,
    factory: Arc<dyn BackendFactory>,
    host: HostPageMatcher,
}

impl Background {
    pub fn new(store: ConfigStore, factory: Arc<dyn BackendFactory>) -> Self {
        Self {
            store,
            factory,
            host: HostPageMatcher::default(),
        }
    }

    pub fn with_host(mut self, host: HostPageMatcher) -> Self {
        self.host = host;
        self
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub async fn handle_value(&self, value: Value) -> Envelope {
        match Message::from_value(value) {
            Ok(message) => self.handle(message).await,
            Err(e) => {
                debug!("Rejected message: {}", e);
                Envelope::failure(&e)
            }
        }
    }

    pub async fn handle(&self, message: Message) -> Envelope {
        let kind = message.kind();
        debug!("Background received {}", kind);

        let result = match message {
            Message::OptimizeSearch(request) => self.optimize_search(request).await,
            Message::RankCandidates(request) => self.rank_candidates(request).await,
            Message::GetConfig => self
                .store
                .load()
                .await
                .map(|config| Envelope::success("Configuration loaded", config)),
            Message::UpdateConfig(partial) => self
                .store
                .update(&partial)
                .await
                .map(|_| Envelope::ack("Configuration saved")),
            other => Err(AssistantError::UnknownRequestType(other.kind().to_string())),
        };

        if let Err(e) = &result {
            match e {
                AssistantError::ExternalService { detail } => {
                    error!("{} failed, LLM service error: {}", kind, detail)
                }
                other => info!("{} failed: {}", kind, other),
            }
        }
        result.into()
    }

    /// Seed the stored config when the extension is first installed.
    pub async fn on_installed(&self, reason: &str) -> AssistantResult<bool> {
        if reason != "install" {
            debug!("Ignoring install event with reason {}", reason);
            return Ok(false);
        }
        self.store.install_defaults().await
    }

    /// A completed load of a host page yields the message to forward to it.
    pub fn on_tab_updated(&self, url: &str, status: &str) -> Option<Message> {
        if status != "complete" || !self.host.matches(url) {
            return None;
        }
        info!("Host page loaded: {}", url);
        Some(Message::PageLoaded(PageLoadedRequest {
            url: url.to_string(),
        }))
    }

    /// Credentials are checked before any backend is built.
    async fn service(&self) -> AssistantResult<LlmService> {
        let config = self.store.load().await?;
        if !config.has_credentials() {
            return Err(AssistantError::ConfigurationMissing);
        }
        let backend = self.factory.connect(&config)?;
        Ok(LlmService::from_config(backend, &config))
    }

    async fn optimize_search(&self, request: OptimizeSearchRequest) -> AssistantResult<Envelope> {
        let service = self.service().await?;

        let job_description = request
            .job_description
            .filter(|description| !description.trim().is_empty());

        let optimized_query = service
            .optimize_search_query(&request.user_input, job_description.as_deref())
            .await?;

        Ok(Envelope::success(
            "Search query optimized",
            OptimizeSearchData {
                user_input: request.user_input,
                job_description,
                optimized_query,
                timestamp: utils::now_millis(),
            },
        ))
    }

    async fn rank_candidates(&self, request: RankCandidatesRequest) -> AssistantResult<Envelope> {
        let service = self.service().await?;

        let ranked_candidates = service
            .rank_candidates(&request.candidates, &request.job_description)
            .await?;

        Ok(Envelope::success(
            format!("Ranked {} candidates", ranked_candidates.len()),
            RankCandidatesData {
                candidate_count: request.candidates.len(),
                job_description: request.job_description,
                ranked_candidates,
                timestamp: utils::now_millis(),
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PluginConfig;
    use crate::core::llm_client::{ChatBackend, ChatCompletionRequest, LlmResponse};
    use crate::types::candidate::FALLBACK_SCORE;
    use crate::types::CandidateProfile;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays a canned reply and counts everything it is asked to do.
    #[derive(Default)]
    struct CountingFactory {
        reply: String,
        connects: AtomicUsize,
        completions: Arc<AtomicUsize>,
        requests: Arc<Mutex<Vec<ChatCompletionRequest>>>,
    }

    struct CannedBackend {
        reply: String,
        completions: Arc<AtomicUsize>,
        requests: Arc<Mutex<Vec<ChatCompletionRequest>>>,
    }

    #[async_trait]
    impl ChatBackend for CannedBackend {
        async fn complete(&self, request: &ChatCompletionRequest) -> AssistantResult<LlmResponse> {
            self.completions.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());
            Ok(LlmResponse {
                content: self.reply.clone(),
                usage: None,
            })
        }
    }

    impl BackendFactory for CountingFactory {
        fn connect(&self, _config: &PluginConfig) -> AssistantResult<Arc<dyn ChatBackend>> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(CannedBackend {
                reply: self.reply.clone(),
                completions: Arc::clone(&self.completions),
                requests: Arc::clone(&self.requests),
            }))
        }
    }

    struct FailingFactory;

    impl BackendFactory for FailingFactory {
        fn connect(&self, _config: &PluginConfig) -> AssistantResult<Arc<dyn ChatBackend>> {
            Err(AssistantError::external("connection refused by upstream 10.0.0.1"))
        }
    }

    fn factory(reply: &str) -> Arc<CountingFactory> {
        Arc::new(CountingFactory {
            reply: reply.to_string(),
            ..Default::default()
        })
    }

    async fn configured(factory: Arc<CountingFactory>) -> Background {
        let store = ConfigStore::in_memory();
        store
            .update(&json!({"apiKey": "sk-test", "defaultModel": "gpt-4o-mini", "temperature": 0.3}))
            .await
            .unwrap();
        Background::new(store, factory)
    }

    #[tokio::test]
    async fn test_optimize_without_api_key_makes_no_calls() {
        let factory = factory("unused");
        let background = Background::new(ConfigStore::in_memory(), factory.clone());

        let envelope = background
            .handle_value(json!({
                "type": "OPTIMIZE_SEARCH",
                "data": {"userInput": "senior backend engineer"}
            }))
            .await;

        assert!(!envelope.success);
        assert_eq!(envelope.error_code.as_deref(), Some("CONFIGURATION_MISSING"));
        assert!(envelope.error_text().unwrap().contains("API key"));
        assert_eq!(factory.connects.load(Ordering::SeqCst), 0);
        assert_eq!(factory.completions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_optimize_returns_raw_model_text() {
        let raw = "{\"keywords\": [\"backend\"], \"location\": \"San Francisco\"}";
        let factory = factory(raw);
        let background = configured(factory.clone()).await;

        let envelope = background
            .handle(Message::OptimizeSearch(OptimizeSearchRequest {
                user_input: "senior backend engineer with Python and AWS in San Francisco".to_string(),
                job_description: None,
            }))
            .await;

        assert!(envelope.success);
        let data: OptimizeSearchData = envelope.data_as().unwrap();
        assert_eq!(data.optimized_query, raw);
        assert!(data.timestamp > 0);
        assert!(data.job_description.is_none());

        let requests = factory.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "gpt-4o-mini");
        assert!((requests[0].temperature - 0.3).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_rank_with_unparseable_reply_falls_back() {
        let background = configured(factory("I think Ada is great")).await;
        let candidates = vec![
            CandidateProfile {
                id: "a".to_string(),
                name: "Ada".to_string(),
                ..Default::default()
            },
            CandidateProfile {
                id: "b".to_string(),
                name: "Brian".to_string(),
                ..Default::default()
            },
        ];

        let envelope = background
            .handle(Message::RankCandidates(RankCandidatesRequest {
                candidates,
                job_description: "Compiler engineer".to_string(),
            }))
            .await;

        let data: RankCandidatesData = envelope.data_as().unwrap();
        assert_eq!(data.candidate_count, 2);
        let ids: Vec<&str> = data.ranked_candidates.iter().map(|c| c.profile.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert!(data
            .ranked_candidates
            .iter()
            .all(|c| c.score == FALLBACK_SCORE && !c.reasoning.is_empty() && c.matched_skills.is_empty()));
    }

    #[tokio::test]
    async fn test_service_errors_hide_detail() {
        let store = ConfigStore::in_memory();
        store.update(&json!({"apiKey": "sk-test"})).await.unwrap();
        let background = Background::new(store, Arc::new(FailingFactory));

        let envelope = background
            .handle_value(json!({"type": "OPTIMIZE_SEARCH", "data": {"userInput": "x"}}))
            .await;

        assert_eq!(envelope.error_code.as_deref(), Some("SERVICE_UNAVAILABLE"));
        assert!(!envelope.error_text().unwrap().contains("10.0.0.1"));
    }

    #[tokio::test]
    async fn test_config_round_trip_through_messages() {
        let background = Background::new(ConfigStore::in_memory(), factory(""));

        let ack = background
            .handle_value(json!({"type": "UPDATE_CONFIG", "data": {"apiKey": "sk-new", "enableSmartRanking": false}}))
            .await;
        assert!(ack.success);

        let envelope = background.handle(Message::GetConfig).await;
        let config: PluginConfig = envelope.data_as().unwrap();
        assert_eq!(config.api_key, "sk-new");
        assert!(!config.enable_smart_ranking);
        assert_eq!(config.default_model, PluginConfig::default().default_model);

        let rejected = background
            .handle_value(json!({"type": "UPDATE_CONFIG", "data": {"temperature": 7}}))
            .await;
        assert_eq!(rejected.error_code.as_deref(), Some("INVALID_CONFIG"));
    }

    #[tokio::test]
    async fn test_unknown_and_page_bound_types_are_rejected() {
        let background = Background::new(ConfigStore::in_memory(), factory(""));

        let unknown = background.handle_value(json!({"type": "DELETE_EVERYTHING"})).await;
        assert_eq!(unknown.error_code.as_deref(), Some("UNKNOWN_REQUEST_TYPE"));

        let page_bound = background.handle(Message::GetCandidates).await;
        assert_eq!(page_bound.error_code.as_deref(), Some("UNKNOWN_REQUEST_TYPE"));
    }

    #[tokio::test]
    async fn test_lifecycle_hooks() {
        let background = Background::new(ConfigStore::in_memory(), factory(""));

        assert!(!background.on_installed("update").await.unwrap());
        assert!(background.on_installed("install").await.unwrap());

        assert!(background
            .on_tab_updated("https://www.linkedin.com/recruiter/search", "loading")
            .is_none());
        assert!(background
            .on_tab_updated("https://www.linkedin.com/feed", "complete")
            .is_none());
        assert_eq!(
            background.on_tab_updated("https://www.linkedin.com/recruiter/search", "complete"),
            Some(Message::PageLoaded(PageLoadedRequest {
                url: "https://www.linkedin.com/recruiter/search".to_string()
            }))
        );
    }
}
