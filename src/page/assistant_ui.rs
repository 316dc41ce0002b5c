// src/page/assistant_ui.rs
//! The floating assistant panel placed inside the host page.

use ego_tree::NodeId;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::page::dom::{DomError, DomEvent, HtmlPage};

pub const PANEL_ID: &str = "recruiter-assistant";
pub const PANEL_INPUT_ID: &str = "assistant-input";
pub const PANEL_BUTTON_ID: &str = "assistant-optimize";

const PANEL_HTML: &str = r#"<div id="recruiter-assistant" class="recruiter-assistant-panel">
  <div class="assistant-header">Recruiter Assistant</div>
  <input id="assistant-input" type="text" placeholder="Describe the candidate you are looking for">
  <button id="assistant-optimize" type="button">Optimize</button>
</div>"#;

/// User interactions raised by the panel.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelAction {
    Optimize { user_input: String },
}

/// Insert the panel at the end of `<body>`, replacing any earlier copy.
pub fn inject_assistant_ui(
    page: &mut HtmlPage,
    actions: UnboundedSender<PanelAction>,
) -> Result<NodeId, DomError> {
    if remove_assistant_ui(page) {
        debug!("Replaced existing assistant panel");
    }

    let panel = page.append_to_body(PANEL_HTML)?;

    if let Some(button) = page.get_element_by_id(PANEL_BUTTON_ID) {
        page.add_event_listener(
            button,
            "click",
            Arc::new(move |page: &HtmlPage, _event: &DomEvent| {
                let user_input = page
                    .get_element_by_id(PANEL_INPUT_ID)
                    .and_then(|input| page.value(input))
                    .unwrap_or_default();
                let user_input = user_input.trim();
                if user_input.is_empty() {
                    return;
                }
                if actions
                    .send(PanelAction::Optimize {
                        user_input: user_input.to_string(),
                    })
                    .is_err()
                {
                    debug!("Panel action dropped, nobody is listening");
                }
            }),
        );
    }

    info!("Assistant panel injected into {}", page.url());
    Ok(panel)
}

pub fn remove_assistant_ui(page: &mut HtmlPage) -> bool {
    match page.get_element_by_id(PANEL_ID) {
        Some(panel) => page.remove(panel),
        None => false,
    }
}

/// Remembers the last seen URL to spot client-side navigations.
#[derive(Debug, Clone)]
pub struct NavigationWatcher {
    last_url: String,
}

impl NavigationWatcher {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            last_url: url.into(),
        }
    }

    /// True when `current` differs from the previous observation.
    pub fn observe(&mut self, current: &str) -> bool {
        if self.last_url == current {
            return false;
        }
        self.last_url = current.to_string();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn page() -> HtmlPage {
        HtmlPage::parse(
            "https://www.linkedin.com/recruiter/search",
            "<html><body><main>results</main></body></html>",
        )
    }

    #[test]
    fn test_inject_once_even_when_called_twice() {
        let mut page = page();
        let (tx, _rx) = mpsc::unbounded_channel();

        inject_assistant_ui(&mut page, tx.clone()).unwrap();
        inject_assistant_ui(&mut page, tx).unwrap();

        assert_eq!(page.to_html().matches("id=\"recruiter-assistant\"").count(), 1);
    }

    #[test]
    fn test_click_sends_trimmed_input() {
        let mut page = page();
        let (tx, mut rx) = mpsc::unbounded_channel();
        inject_assistant_ui(&mut page, tx).unwrap();

        let button = page.get_element_by_id(PANEL_BUTTON_ID).unwrap();
        page.click(button);
        assert!(rx.try_recv().is_err());

        let input = page.get_element_by_id(PANEL_INPUT_ID).unwrap();
        page.set_value(input, "  rust backend lead ").unwrap();
        page.click(button);

        assert_eq!(
            rx.try_recv().unwrap(),
            PanelAction::Optimize {
                user_input: "rust backend lead".to_string()
            }
        );
    }

    #[test]
    fn test_navigation_watcher() {
        let mut watcher = NavigationWatcher::new("https://a/recruiter/1");
        assert!(!watcher.observe("https://a/recruiter/1"));
        assert!(watcher.observe("https://a/recruiter/2"));
        assert!(!watcher.observe("https://a/recruiter/2"));
    }
}
