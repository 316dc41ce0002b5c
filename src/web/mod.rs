// src/web/mod.rs
//! HTTP surface: the runtime and page message channels as JSON routes, plus
//! the popup rendered as plain HTML forms.

pub mod handlers;
pub mod types;

pub use types::*;

use anyhow::{Context, Result};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::form::Form;
use rocket::http::{Header, Status};
use rocket::response::content::RawHtml;
use rocket::serde::json::Json;
use rocket::{catchers, get, options, post, routes, Build, Request, Response, Rocket, State};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::background::Background;
use crate::bus::{ExtensionBus, MessageBus, TabSlot};
use crate::core::config_manager::ConfigManager;
use crate::core::config_store::{ConfigStore, JsonFileStore};
use crate::core::llm_client::HttpBackendFactory;
use crate::error::AssistantError;
use crate::types::Envelope;
use crate::ui::Popup;

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new("Access-Control-Allow-Methods", "POST, GET, OPTIONS"));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
    }
}

impl ServerState {
    /// Wire the background, the bus and the popup over the file-backed store.
    pub async fn new(settings: ConfigManager) -> Result<Self> {
        let store = ConfigStore::new(Arc::new(JsonFileStore::new(&settings.store_path)));
        let background = Background::new(store, Arc::new(HttpBackendFactory))
            .with_host(settings.host.clone());

        if background
            .on_installed("install")
            .await
            .context("Failed to install default settings")?
        {
            info!("Installed default settings at {}", settings.store_path.display());
        }

        let selectors = Arc::new(settings.load_selectors()?);
        let bus = ExtensionBus::new(Arc::new(background), TabSlot::default());
        let popup_bus: Arc<dyn MessageBus> = Arc::new(bus.clone());
        let popup = Popup::new(popup_bus, settings.host.clone());

        Ok(Self {
            bus,
            selectors,
            settings,
            popup: Mutex::new(popup),
        })
    }
}

#[post("/runtime/message", data = "<request>")]
pub async fn runtime_message(request: Json<Value>, state: &State<ServerState>) -> Json<Envelope> {
    handlers::runtime_message_handler(request, state).await
}

#[post("/page/message", data = "<request>")]
pub async fn page_message(
    request: Json<PageMessageRequest>,
    state: &State<ServerState>,
) -> Json<PageMessageResponse> {
    handlers::page_message_handler(request, state).await
}

#[post("/page/navigate", data = "<request>")]
pub async fn navigate(request: Json<NavigateRequest>, state: &State<ServerState>) -> Json<Envelope> {
    handlers::navigate_handler(request, state).await
}

#[get("/health")]
pub async fn health() -> Json<HealthResponse> {
    handlers::health_handler().await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

#[get("/popup?<tab>")]
pub async fn popup_page(tab: Option<&str>, state: &State<ServerState>) -> RawHtml<String> {
    handlers::popup_page_handler(tab, state).await
}

#[post("/popup/optimizer", data = "<form>")]
pub async fn popup_optimizer(form: Form<OptimizerForm>, state: &State<ServerState>) -> RawHtml<String> {
    handlers::popup_optimizer_handler(form, state).await
}

#[post("/popup/ranker", data = "<form>")]
pub async fn popup_ranker(form: Form<RankerForm>, state: &State<ServerState>) -> RawHtml<String> {
    handlers::popup_ranker_handler(form, state).await
}

#[post("/popup/config", data = "<form>")]
pub async fn popup_config(form: Form<ConfigForm>, state: &State<ServerState>) -> RawHtml<String> {
    handlers::popup_config_handler(form, state).await
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> Json<Envelope> {
    Json(Envelope::failure(&AssistantError::invalid_payload(
        "request",
        "malformed body",
    )))
}

#[rocket::catch(404)]
pub fn not_found(request: &Request<'_>) -> Json<Envelope> {
    Json(Envelope::failure(&AssistantError::UnknownRequestType(
        request.uri().path().to_string(),
    )))
}

#[rocket::catch(422)]
pub fn unprocessable(request: &Request<'_>) -> Json<Envelope> {
    warn!("Unprocessable body for {}", request.uri());
    bad_request()
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<Envelope> {
    Json(Envelope::failure(&AssistantError::external("internal server error")))
}

pub fn build_rocket(state: ServerState, port: u16) -> Rocket<Build> {
    let figment = rocket::Config::figment().merge(("port", port));

    rocket::custom(figment)
        .attach(Cors)
        .manage(state)
        .register("/", catchers![bad_request, not_found, unprocessable, internal_error])
        .mount("/api", routes![runtime_message, page_message, navigate, health, options])
        .mount("/", routes![popup_page, popup_optimizer, popup_ranker, popup_config])
}

// Main server start function
pub async fn start_web_server(settings: ConfigManager) -> Result<()> {
    let port = settings.port;
    let state = ServerState::new(settings).await?;

    info!("Starting recruiter assistant on port {}", port);
    info!("Popup available at http://localhost:{}/popup", port);

    let _rocket = build_rocket(state, port)
        .launch()
        .await
        .context("Web server stopped with an error")?;

    Ok(())
}
