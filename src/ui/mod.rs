// src/ui/mod.rs
//! Popup shell: settings, search optimizer and candidate ranker tabs.

pub mod config_panel;
pub mod optimizer;
pub mod ranker;
pub mod render;

pub use config_panel::{ConfigDraft, ConfigPanel};
pub use optimizer::SearchOptimizerPanel;
pub use ranker::CandidateRankerPanel;

use std::sync::Arc;
use tracing::debug;

use crate::bus::MessageBus;
use crate::core::config_manager::HostPageMatcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Config,
    Optimizer,
    Ranker,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Config, Tab::Optimizer, Tab::Ranker];

    pub fn id(&self) -> &'static str {
        match self {
            Tab::Config => "config",
            Tab::Optimizer => "optimizer",
            Tab::Ranker => "ranker",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Config => "Settings",
            Tab::Optimizer => "Search optimizer",
            Tab::Ranker => "Candidate ranking",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tab| tab.id() == id)
    }
}

pub struct Popup {
    bus: Arc<dyn MessageBus>,
    host: HostPageMatcher,
    pub active_tab: Tab,
    pub config: ConfigPanel,
    pub optimizer: SearchOptimizerPanel,
    pub ranker: CandidateRankerPanel,
}

impl Popup {
    pub fn new(bus: Arc<dyn MessageBus>, host: HostPageMatcher) -> Self {
        Self {
            bus,
            host,
            active_tab: Tab::default(),
            config: ConfigPanel::default(),
            optimizer: SearchOptimizerPanel::default(),
            ranker: CandidateRankerPanel::default(),
        }
    }

    /// Load the stored settings, as the popup does every time it opens.
    pub async fn open(&mut self) {
        self.config.load(self.bus.as_ref()).await;
    }

    pub fn select_tab(&mut self, tab: Tab) {
        self.active_tab = tab;
    }

    pub async fn save_config(&mut self, edits: &ConfigDraft) -> bool {
        self.active_tab = Tab::Config;
        self.config.apply_draft(edits);
        self.config.save(self.bus.as_ref()).await
    }

    pub fn cancel_config(&mut self) {
        self.config.cancel();
    }

    /// Optimize, then apply straight away when auto-optimization is on and
    /// the active tab is a host page.
    pub async fn optimize(&mut self, user_input: &str, job_description: &str) -> bool {
        self.active_tab = Tab::Optimizer;
        self.optimizer.user_input = user_input.to_string();
        self.optimizer.job_description = job_description.to_string();

        if !self.optimizer.optimize(self.bus.as_ref()).await {
            return false;
        }

        if self.config.config.enable_auto_optimization {
            let on_host_page = self
                .bus
                .active_tab_url()
                .await
                .map(|url| self.host.matches(&url))
                .unwrap_or(false);
            if on_host_page {
                debug!("Auto-applying optimized query");
                return self.optimizer.apply_to_page(self.bus.as_ref(), &self.host).await;
            }
        }
        true
    }

    pub async fn apply_optimized(&mut self) -> bool {
        self.active_tab = Tab::Optimizer;
        self.optimizer.apply_to_page(self.bus.as_ref(), &self.host).await
    }

    pub fn clear_optimized(&mut self) {
        self.optimizer.clear();
    }

    pub async fn rank(&mut self, job_description: &str) -> bool {
        self.active_tab = Tab::Ranker;
        self.ranker.job_description = job_description.to_string();

        if !self.config.config.enable_smart_ranking {
            self.ranker.ranked.clear();
            self.ranker.error = Some("Smart ranking is turned off in settings".to_string());
            return false;
        }
        self.ranker.rank(self.bus.as_ref(), &self.host).await
    }
}
