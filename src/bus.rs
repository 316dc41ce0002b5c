// src/bus.rs
//! Cross-context messaging between the popup, the background orchestrator
//! and the content script of the active host page.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::background::Background;
use crate::error::AssistantError;
use crate::page::assistant_ui::PanelAction;
use crate::page::ContentScript;
use crate::types::message::{ApplyQueryRequest, OptimizeSearchData, OptimizeSearchRequest};
use crate::types::{Envelope, Message};

/// Content script of whichever host page is currently open, if any.
pub type TabSlot = Arc<RwLock<Option<Arc<ContentScript>>>>;

#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Deliver to the background orchestrator.
    async fn send_runtime_message(&self, message: Message) -> Envelope;

    /// Deliver to the content script of the active tab.
    async fn send_tab_message(&self, message: Message) -> Envelope;

    async fn active_tab_url(&self) -> Option<String>;
}

#[derive(Clone)]
pub struct ExtensionBus {
    background: Arc<Background>,
    tab: TabSlot,
}

impl ExtensionBus {
    pub fn new(background: Arc<Background>, tab: TabSlot) -> Self {
        Self { background, tab }
    }

    pub fn background(&self) -> &Arc<Background> {
        &self.background
    }

    pub fn tab_slot(&self) -> TabSlot {
        Arc::clone(&self.tab)
    }

    /// Make `script` the active tab and tell it when its load completed.
    pub async fn open_tab(&self, script: Arc<ContentScript>) -> Option<Envelope> {
        let url = script.page().lock().await.url().to_string();
        *self.tab.write().await = Some(Arc::clone(&script));

        match self.background.on_tab_updated(&url, "complete") {
            Some(message) => Some(script.handle_message(message).await),
            None => {
                debug!("Opened tab {} is not a host page", url);
                None
            }
        }
    }

    async fn active_script(&self) -> Option<Arc<ContentScript>> {
        self.tab.read().await.clone()
    }
}

#[async_trait]
impl MessageBus for ExtensionBus {
    async fn send_runtime_message(&self, message: Message) -> Envelope {
        self.background.handle(message).await
    }

    async fn send_tab_message(&self, message: Message) -> Envelope {
        match self.active_script().await {
            Some(script) => script.handle_message(message).await,
            None => Envelope::failure(&AssistantError::ElementNotFound(
                "host page tab".to_string(),
            )),
        }
    }

    async fn active_tab_url(&self) -> Option<String> {
        let script = self.active_script().await?;
        let page = script.page();
        let url = page.lock().await.url().to_string();
        Some(url)
    }
}

/// Serve clicks on the in-page assistant panel: optimize the typed need,
/// then write the result into the page's search form.
pub async fn run_panel_actions(mut actions: UnboundedReceiver<PanelAction>, bus: Arc<dyn MessageBus>) {
    while let Some(action) = actions.recv().await {
        match action {
            PanelAction::Optimize { user_input } => {
                info!("Panel requested optimization");
                let optimized = bus
                    .send_runtime_message(Message::OptimizeSearch(OptimizeSearchRequest {
                        user_input,
                        job_description: None,
                    }))
                    .await;

                let Some(data) = optimized.data_as::<OptimizeSearchData>() else {
                    warn!(
                        "Panel optimization failed: {}",
                        optimized.error_text().unwrap_or("no data returned")
                    );
                    continue;
                };

                let applied = bus
                    .send_tab_message(Message::ApplyOptimizedQuery(ApplyQueryRequest {
                        optimized_query: data.optimized_query,
                        structured: false,
                    }))
                    .await;
                if !applied.success {
                    warn!(
                        "Panel could not apply query: {}",
                        applied.error_text().unwrap_or("unknown error")
                    );
                }
            }
        }
    }
    debug!("Panel action channel closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PluginConfig;
    use crate::core::config_store::ConfigStore;
    use crate::core::llm_client::{BackendFactory, ChatBackend, ChatCompletionRequest, LlmResponse};
    use crate::error::AssistantResult;
    use crate::page::{HtmlPage, PageSelectors};
    use serde_json::json;

    struct EchoFactory;
    struct EchoBackend;

    #[async_trait]
    impl ChatBackend for EchoBackend {
        async fn complete(&self, _request: &ChatCompletionRequest) -> AssistantResult<LlmResponse> {
            Ok(LlmResponse {
                content: "rust AND tokio".to_string(),
                usage: None,
            })
        }
    }

    impl BackendFactory for EchoFactory {
        fn connect(&self, _config: &PluginConfig) -> AssistantResult<Arc<dyn ChatBackend>> {
            Ok(Arc::new(EchoBackend))
        }
    }

    const HOST_URL: &str = "https://www.linkedin.com/recruiter/search";
    const HOST_PAGE: &str = r#"<html><body><form role="search"><input name="keywords"></form></body></html>"#;

    async fn bus() -> ExtensionBus {
        let store = ConfigStore::in_memory();
        store.update(&json!({"apiKey": "sk-test"})).await.unwrap();
        let background = Arc::new(Background::new(store, Arc::new(EchoFactory)));
        ExtensionBus::new(background, TabSlot::default())
    }

    fn keyword_value(page: &HtmlPage) -> Option<String> {
        page.query(&PageSelectors::default().search_input)
            .and_then(|input| page.value(input))
    }

    #[tokio::test]
    async fn test_tab_message_without_tab_fails() {
        let bus = bus().await;
        assert!(bus.active_tab_url().await.is_none());

        let envelope = bus.send_tab_message(Message::GetCandidates).await;
        assert_eq!(envelope.error_code.as_deref(), Some("ELEMENT_NOT_FOUND"));
    }

    #[tokio::test]
    async fn test_open_host_tab_forwards_page_loaded() {
        let bus = bus().await;
        let (script, _rx) = ContentScript::new(
            HtmlPage::parse(HOST_URL, HOST_PAGE),
            Arc::new(PageSelectors::default()),
        );

        let reply = bus.open_tab(Arc::new(script)).await;
        assert!(reply.unwrap().success);
        assert_eq!(bus.active_tab_url().await.as_deref(), Some(HOST_URL));

        let (other, _rx) = ContentScript::new(
            HtmlPage::parse("https://example.com/", "<p></p>"),
            Arc::new(PageSelectors::default()),
        );
        assert!(bus.open_tab(Arc::new(other)).await.is_none());
    }

    #[tokio::test]
    async fn test_panel_click_optimizes_and_applies() {
        let bus = bus().await;
        let (script, _actions) = ContentScript::new(
            HtmlPage::parse(HOST_URL, HOST_PAGE),
            Arc::new(PageSelectors::default()),
        );
        let script = Arc::new(script);
        bus.open_tab(Arc::clone(&script)).await;

        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        tx.send(PanelAction::Optimize {
            user_input: "async rust".to_string(),
        })
        .unwrap();
        drop(tx);

        run_panel_actions(rx, Arc::new(bus.clone())).await;

        let page = script.page();
        let page = page.lock().await;
        assert_eq!(keyword_value(&page).as_deref(), Some("rust AND tokio"));
    }
}
