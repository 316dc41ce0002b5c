// src/web/handlers/message_handlers.rs
use rocket::serde::json::Json;
use rocket::State;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::bus::{run_panel_actions, MessageBus};
use crate::error::{AssistantError, AssistantResult};
use crate::page::{ContentScript, HtmlPage};
use crate::types::{Envelope, Message};
use crate::web::types::{NavigateRequest, PageMessageRequest, PageMessageResponse, ServerState};

pub async fn runtime_message_handler(
    request: Json<Value>,
    state: &State<ServerState>,
) -> Json<Envelope> {
    Json(state.bus.background().handle_value(request.into_inner()).await)
}

pub async fn page_message_handler(
    request: Json<PageMessageRequest>,
    state: &State<ServerState>,
) -> Json<PageMessageResponse> {
    let request = request.into_inner();

    if let (Some(url), Some(html)) = (&request.url, &request.html) {
        if let Err(e) = open_snapshot(state, url, html).await {
            warn!("Failed to open page snapshot {}: {}", url, e);
            return Json(PageMessageResponse {
                envelope: Envelope::failure(&e),
                html: None,
            });
        }
    }

    let envelope = match Message::from_value(request.message) {
        Ok(message) => state.bus.send_tab_message(message).await,
        Err(e) => Envelope::failure(&e),
    };

    Json(PageMessageResponse {
        envelope,
        html: current_html(state).await,
    })
}

pub async fn navigate_handler(
    request: Json<NavigateRequest>,
    state: &State<ServerState>,
) -> Json<Envelope> {
    let Some(script) = state.bus.tab_slot().read().await.clone() else {
        return Json(Envelope::failure(&AssistantError::ElementNotFound(
            "host page tab".to_string(),
        )));
    };

    script.page().lock().await.set_url(request.url.clone());
    let reinjecting = script.on_dom_mutation().await.is_some();

    Json(Envelope::ack(if reinjecting {
        "Navigation detected, assistant will be re-injected"
    } else {
        "URL unchanged"
    }))
}

/// Load a page snapshot as the active tab: inject the panel, announce the
/// load and serve the panel's clicks.
pub async fn open_snapshot(state: &ServerState, url: &str, html: &str) -> AssistantResult<()> {
    let (script, actions) = ContentScript::new(HtmlPage::parse(url, html), Arc::clone(&state.selectors));
    let script = Arc::new(
        script
            .with_settle_delay(state.settings.settle_delay)
            .with_host(state.settings.host.clone()),
    );

    script.start().await?;
    state.bus.open_tab(Arc::clone(&script)).await;

    let bus: Arc<dyn MessageBus> = Arc::new(state.bus.clone());
    tokio::spawn(run_panel_actions(actions, bus));

    info!("Opened page snapshot {}", url);
    Ok(())
}

async fn current_html(state: &ServerState) -> Option<String> {
    let script = state.bus.tab_slot().read().await.clone()?;
    let page = script.page();
    let html = page.lock().await.to_html();
    Some(html)
}
