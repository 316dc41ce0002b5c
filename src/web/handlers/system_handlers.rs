// src/web/handlers/system_handlers.rs
use rocket::serde::json::Json;
use tracing::debug;

use crate::web::types::HealthResponse;

pub async fn health_handler() -> Json<HealthResponse> {
    debug!("Health check");
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
