// src/web/handlers/popup_handlers.rs
use rocket::form::Form;
use rocket::response::content::RawHtml;
use rocket::State;
use tracing::warn;

use crate::ui::render::render_popup;
use crate::ui::Tab;
use crate::web::types::{ConfigForm, OptimizerForm, RankerForm, ServerState};

pub async fn popup_page_handler(tab: Option<&str>, state: &State<ServerState>) -> RawHtml<String> {
    let mut popup = state.popup.lock().await;

    if let Some(tab) = tab.and_then(Tab::from_id) {
        popup.select_tab(tab);
    }
    if !popup.config.editing {
        popup.open().await;
    }

    RawHtml(render_popup(&popup))
}

pub async fn popup_optimizer_handler(
    form: Form<OptimizerForm>,
    state: &State<ServerState>,
) -> RawHtml<String> {
    let mut popup = state.popup.lock().await;
    let user_input = form.user_input.clone().unwrap_or_default();
    let job_description = form.job_description.clone().unwrap_or_default();

    match form.action.as_str() {
        "optimize" => {
            popup.optimize(&user_input, &job_description).await;
        }
        "apply" => {
            popup.apply_optimized().await;
        }
        "clear" => popup.clear_optimized(),
        other => warn!("Unknown optimizer action {}", other),
    }

    RawHtml(render_popup(&popup))
}

pub async fn popup_ranker_handler(
    form: Form<RankerForm>,
    state: &State<ServerState>,
) -> RawHtml<String> {
    let mut popup = state.popup.lock().await;
    let job_description = form.job_description.clone().unwrap_or_default();
    popup.rank(&job_description).await;
    RawHtml(render_popup(&popup))
}

pub async fn popup_config_handler(
    form: Form<ConfigForm>,
    state: &State<ServerState>,
) -> RawHtml<String> {
    let mut popup = state.popup.lock().await;
    popup.select_tab(Tab::Config);

    match form.action.as_str() {
        "edit" => popup.config.begin_edit(),
        "cancel" => popup.cancel_config(),
        "save" => {
            popup.save_config(&form.to_draft()).await;
        }
        other => warn!("Unknown settings action {}", other),
    }

    RawHtml(render_popup(&popup))
}
