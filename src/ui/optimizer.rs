// src/ui/optimizer.rs
use tracing::debug;

use crate::bus::MessageBus;
use crate::core::config_manager::HostPageMatcher;
use crate::types::message::{ApplyQueryRequest, OptimizeSearchData, OptimizeSearchRequest};
use crate::types::Message;
use crate::ui::config_panel::failure_text;

pub const NOT_ON_HOST_PAGE: &str = "Open a LinkedIn Recruiter page to use this feature";

/// Search optimizer tab.
#[derive(Debug, Clone, Default)]
pub struct SearchOptimizerPanel {
    pub user_input: String,
    pub job_description: String,
    pub optimized_query: Option<String>,
    pub error: Option<String>,
    pub success_message: Option<String>,
}

impl SearchOptimizerPanel {
    /// Ask the background for an optimized query. Returns whether one was produced.
    pub async fn optimize(&mut self, bus: &dyn MessageBus) -> bool {
        self.error = None;
        self.success_message = None;
        self.optimized_query = None;

        let user_input = self.user_input.trim().to_string();
        if user_input.is_empty() {
            self.error = Some("Describe the hiring need first".to_string());
            return false;
        }

        let job_description = Some(self.job_description.trim().to_string())
            .filter(|description| !description.is_empty());

        let envelope = bus
            .send_runtime_message(Message::OptimizeSearch(OptimizeSearchRequest {
                user_input,
                job_description,
            }))
            .await;

        match envelope.data_as::<OptimizeSearchData>() {
            Some(data) => {
                self.optimized_query = Some(data.optimized_query);
                true
            }
            None => {
                self.error = Some(failure_text(&envelope, "Search optimization failed"));
                false
            }
        }
    }

    /// Send the optimized query to the active host page.
    pub async fn apply_to_page(&mut self, bus: &dyn MessageBus, host: &HostPageMatcher) -> bool {
        let Some(optimized_query) = self.optimized_query.clone() else {
            self.error = Some("Nothing to apply yet, optimize a query first".to_string());
            return false;
        };

        match bus.active_tab_url().await {
            Some(url) if host.matches(&url) => {}
            Some(url) => {
                debug!("Active tab {} is not a host page", url);
                self.error = Some(NOT_ON_HOST_PAGE.to_string());
                return false;
            }
            None => {
                self.error = Some("Could not read the active tab".to_string());
                return false;
            }
        }

        let envelope = bus
            .send_tab_message(Message::ApplyOptimizedQuery(ApplyQueryRequest {
                optimized_query,
                structured: false,
            }))
            .await;

        if envelope.success {
            self.error = None;
            self.success_message = Some("Search criteria applied to LinkedIn".to_string());
            true
        } else {
            self.success_message = None;
            self.error = Some(failure_text(&envelope, "Failed to apply search criteria"));
            false
        }
    }

    pub fn clear(&mut self) {
        self.optimized_query = None;
        self.success_message = None;
        self.error = None;
    }
}
