// src/page/content_script.rs
//! Page-side message handler: owns the live page, answers page-bound
//! messages and keeps the assistant panel alive across navigations.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::core::config_manager::{HostPageMatcher, DEFAULT_SETTLE_DELAY_MS};
use crate::error::{AssistantError, AssistantResult};
use crate::page::assistant_ui::{self, NavigationWatcher, PanelAction};
use crate::page::dom::HtmlPage;
use crate::page::extractor;
use crate::page::injector;
use crate::page::selectors::PageSelectors;
use crate::types::message::{ApplyQueryRequest, CandidatesData};
use crate::types::{Envelope, Message, SearchQuery};

pub const READY_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(3);

pub type SharedPage = Arc<Mutex<HtmlPage>>;

pub struct ContentScript {
    page: SharedPage,
    selectors: Arc<PageSelectors>,
    host: HostPageMatcher,
    settle_delay: Duration,
    navigation: Mutex<NavigationWatcher>,
    actions: UnboundedSender<PanelAction>,
}

impl ContentScript {
    /// Returns the script and the receiving end of the panel's actions.
    pub fn new(page: HtmlPage, selectors: Arc<PageSelectors>) -> (Self, UnboundedReceiver<PanelAction>) {
        let (actions, receiver) = mpsc::unbounded_channel();
        let navigation = NavigationWatcher::new(page.url());

        let script = Self {
            page: Arc::new(Mutex::new(page)),
            selectors,
            host: HostPageMatcher::default(),
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
            navigation: Mutex::new(navigation),
            actions,
        };
        (script, receiver)
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn with_host(mut self, host: HostPageMatcher) -> Self {
        self.host = host;
        self
    }

    pub fn page(&self) -> SharedPage {
        Arc::clone(&self.page)
    }

    /// The page is on a recruiter path and its search form has rendered.
    pub async fn is_ready(&self) -> bool {
        let page = self.page.lock().await;
        self.host.matches_path(page.url()) && page.query(&self.selectors.search_form).is_some()
    }

    /// Poll readiness once per second until `timeout` elapses.
    pub async fn wait_until_ready(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.is_ready().await {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }

    /// Wait for the page, then place the assistant panel.
    pub async fn start(&self) -> AssistantResult<()> {
        if !self.wait_until_ready(DEFAULT_READY_TIMEOUT).await {
            warn!("Search page not ready, injecting the assistant anyway");
        }

        let mut page = self.page.lock().await;
        assistant_ui::inject_assistant_ui(&mut page, self.actions.clone())
            .map_err(|e| AssistantError::ElementNotFound(format!("page body: {}", e)))?;
        Ok(())
    }

    /// Call after any DOM mutation. A URL change schedules a panel
    /// re-injection once the page has had `settle_delay` to re-render.
    pub async fn on_dom_mutation(&self) -> Option<JoinHandle<()>> {
        let url = self.page.lock().await.url().to_string();
        if !self.navigation.lock().await.observe(&url) {
            return None;
        }

        info!("Navigation detected to {}", url);
        let page = Arc::clone(&self.page);
        let actions = self.actions.clone();
        let settle_delay = self.settle_delay;

        Some(tokio::spawn(async move {
            tokio::time::sleep(settle_delay).await;
            let mut page = page.lock().await;
            if let Err(e) = assistant_ui::inject_assistant_ui(&mut page, actions) {
                warn!("Failed to re-inject assistant panel: {}", e);
            }
        }))
    }

    pub async fn handle_value(&self, value: Value) -> Envelope {
        match Message::from_value(value) {
            Ok(message) => self.handle_message(message).await,
            Err(e) => Envelope::failure(&e),
        }
    }

    pub async fn handle_message(&self, message: Message) -> Envelope {
        debug!("Page received {}", message.kind());
        match message {
            Message::ApplyOptimizedQuery(request) => self.apply_optimized_query(request).await.into(),
            Message::PageLoaded(request) => {
                info!("Page loaded: {}", request.url);
                Envelope::ack("Page load acknowledged")
            }
            Message::GetCandidates => self.get_candidates().await,
            other => Envelope::failure(&AssistantError::UnknownRequestType(other.kind().to_string())),
        }
    }

    async fn apply_optimized_query(&self, request: ApplyQueryRequest) -> AssistantResult<Envelope> {
        let text = request.optimized_query.trim();
        if text.is_empty() {
            return Err(AssistantError::invalid_payload(
                crate::types::message::APPLY_OPTIMIZED_QUERY,
                "optimized query is empty",
            ));
        }

        let query = if request.structured {
            SearchQuery::from_model_output(text).unwrap_or_else(|e| {
                warn!("Optimized query is not structured ({}), applying it as text", e);
                SearchQuery::from_text(text)
            })
        } else {
            SearchQuery::from_text(text)
        };

        let mut page = self.page.lock().await;
        let report = injector::apply_search_query(&mut page, &self.selectors, &query)?;
        Ok(Envelope::success("Search criteria applied", report))
    }

    async fn get_candidates(&self) -> Envelope {
        let page = self.page.lock().await;
        let data = CandidatesData {
            candidates: extractor::extract_search_results(&page, &self.selectors),
            job_description: extractor::extract_job_description(&page, &self.selectors),
        };
        Envelope::success(format!("Found {} candidates", data.candidates.len()), data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::assistant_ui::{PANEL_BUTTON_ID, PANEL_ID, PANEL_INPUT_ID};
    use serde_json::json;

    const SEARCH_PAGE: &str = r#"
        <html><body>
          <div class="job-description">Staff platform engineer</div>
          <form role="search"><input name="keywords"></form>
          <div class="search-result"><span class="name">Ken Thompson</span></div>
        </body></html>"#;

    fn script(url: &str, html: &str) -> (ContentScript, UnboundedReceiver<PanelAction>) {
        ContentScript::new(HtmlPage::parse(url, html), Arc::new(PageSelectors::default()))
    }

    #[tokio::test]
    async fn test_apply_literal_query() {
        let (script, _rx) = script("https://www.linkedin.com/recruiter/search", SEARCH_PAGE);
        let envelope = script
            .handle_value(json!({
                "type": "APPLY_OPTIMIZED_QUERY",
                "data": {"optimizedQuery": "kernel hacker"}
            }))
            .await;

        assert!(envelope.success, "{:?}", envelope);
        let page = script.page();
        let page = page.lock().await;
        let input = page.query(&PageSelectors::default().search_input).unwrap();
        assert_eq!(page.value(input).as_deref(), Some("kernel hacker"));
        assert_eq!(page.events_on(input), ["input", "change"]);
    }

    #[tokio::test]
    async fn test_apply_structured_query_falls_back_to_text() {
        let (script, _rx) = script("https://www.linkedin.com/recruiter/search", SEARCH_PAGE);
        let envelope = script
            .handle_message(Message::ApplyOptimizedQuery(ApplyQueryRequest {
                optimized_query: "not json at all".to_string(),
                structured: true,
            }))
            .await;
        assert!(envelope.success);

        let page = script.page();
        let page = page.lock().await;
        let input = page.query(&PageSelectors::default().search_input).unwrap();
        assert_eq!(page.value(input).as_deref(), Some("not json at all"));
    }

    #[tokio::test]
    async fn test_apply_without_form_fails() {
        let (script, _rx) = script("https://www.linkedin.com/recruiter/search", "<p>loading</p>");
        let envelope = script
            .handle_message(Message::ApplyOptimizedQuery(ApplyQueryRequest {
                optimized_query: "anything".to_string(),
                structured: false,
            }))
            .await;

        assert!(!envelope.success);
        assert_eq!(envelope.error_code.as_deref(), Some("ELEMENT_NOT_FOUND"));
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected() {
        let (script, _rx) = script("https://www.linkedin.com/recruiter/search", SEARCH_PAGE);
        let envelope = script
            .handle_value(json!({"type": "APPLY_OPTIMIZED_QUERY", "data": {"optimizedQuery": "  "}}))
            .await;
        assert_eq!(envelope.error_code.as_deref(), Some("INVALID_PAYLOAD"));
    }

    #[tokio::test]
    async fn test_get_candidates_and_page_loaded() {
        let (script, _rx) = script("https://www.linkedin.com/recruiter/search", SEARCH_PAGE);

        let envelope = script.handle_message(Message::GetCandidates).await;
        let data: CandidatesData = envelope.data_as().unwrap();
        assert_eq!(data.candidates.len(), 1);
        assert_eq!(data.candidates[0].name, "Ken Thompson");
        assert_eq!(data.job_description, "Staff platform engineer");

        let ack = script
            .handle_value(json!({"type": "PAGE_LOADED", "data": {"url": "https://www.linkedin.com/recruiter/search"}}))
            .await;
        assert!(ack.success);
    }

    #[tokio::test]
    async fn test_background_messages_are_unknown_here() {
        let (script, _rx) = script("https://www.linkedin.com/recruiter/search", SEARCH_PAGE);
        let envelope = script.handle_message(Message::GetConfig).await;
        assert_eq!(envelope.error_code.as_deref(), Some("UNKNOWN_REQUEST_TYPE"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_ready_times_out() {
        let (spinner, _rx) = script("https://www.linkedin.com/recruiter/search", "<p>spinner</p>");
        let started = tokio::time::Instant::now();
        assert!(!spinner.wait_until_ready(DEFAULT_READY_TIMEOUT).await);
        assert!(started.elapsed() >= DEFAULT_READY_TIMEOUT);

        let (ready, _rx) = script("https://www.linkedin.com/recruiter/search", SEARCH_PAGE);
        assert!(ready.wait_until_ready(DEFAULT_READY_TIMEOUT).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panel_is_reinjected_after_navigation_settles() {
        let (script, mut rx) = script("https://www.linkedin.com/recruiter/search", SEARCH_PAGE);
        let script = script.with_settle_delay(Duration::from_millis(2000));
        script.start().await.unwrap();

        assert!(script.on_dom_mutation().await.is_none());

        {
            let page = script.page();
            let mut page = page.lock().await;
            page.set_url("https://www.linkedin.com/recruiter/search?page=2");
            let panel = page.get_element_by_id(PANEL_ID).unwrap();
            page.remove(panel);
        }

        let handle = script.on_dom_mutation().await.unwrap();

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert!(script.page().lock().await.get_element_by_id(PANEL_ID).is_none());

        tokio::time::sleep(Duration::from_millis(2)).await;
        handle.await.unwrap();

        let page = script.page();
        let mut page = page.lock().await;
        assert!(page.get_element_by_id(PANEL_ID).is_some());

        let input = page.get_element_by_id(PANEL_INPUT_ID).unwrap();
        page.set_value(input, "distributed systems").unwrap();
        let button = page.get_element_by_id(PANEL_BUTTON_ID).unwrap();
        page.click(button);
        assert_eq!(
            rx.try_recv().unwrap(),
            PanelAction::Optimize {
                user_input: "distributed systems".to_string()
            }
        );
    }
}
