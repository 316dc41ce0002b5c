// src/ui/ranker.rs
use crate::bus::MessageBus;
use crate::core::config_manager::HostPageMatcher;
use crate::types::message::{CandidatesData, RankCandidatesData, RankCandidatesRequest};
use crate::types::{Message, RankedCandidate};
use crate::ui::config_panel::failure_text;
use crate::ui::optimizer::NOT_ON_HOST_PAGE;

/// Candidate ranker tab. Candidates come from the active page, the ranking
/// from the background.
#[derive(Debug, Clone, Default)]
pub struct CandidateRankerPanel {
    pub job_description: String,
    pub ranked: Vec<RankedCandidate>,
    pub error: Option<String>,
}

impl CandidateRankerPanel {
    pub async fn rank(&mut self, bus: &dyn MessageBus, host: &HostPageMatcher) -> bool {
        self.error = None;
        self.ranked.clear();

        let on_host_page = bus
            .active_tab_url()
            .await
            .map(|url| host.matches(&url))
            .unwrap_or(false);
        if !on_host_page {
            self.error = Some(NOT_ON_HOST_PAGE.to_string());
            return false;
        }

        let page_envelope = bus.send_tab_message(Message::GetCandidates).await;
        let Some(page_data) = page_envelope.data_as::<CandidatesData>() else {
            self.error = Some(failure_text(&page_envelope, "Failed to read candidates from the page"));
            return false;
        };

        if page_data.candidates.is_empty() {
            self.error = Some("No candidates found on the page".to_string());
            return false;
        }

        let job_description = match self.job_description.trim() {
            "" => page_data.job_description.trim().to_string(),
            typed => typed.to_string(),
        };
        if job_description.is_empty() {
            self.error = Some("Enter a job description first".to_string());
            return false;
        }

        let envelope = bus
            .send_runtime_message(Message::RankCandidates(RankCandidatesRequest {
                candidates: page_data.candidates,
                job_description,
            }))
            .await;

        match envelope.data_as::<RankCandidatesData>() {
            Some(data) => {
                let mut ranked = data.ranked_candidates;
                ranked.sort_by(|a, b| b.score.cmp(&a.score));
                self.ranked = ranked;
                true
            }
            None => {
                self.error = Some(failure_text(&envelope, "Candidate ranking failed"));
                false
            }
        }
    }
}
