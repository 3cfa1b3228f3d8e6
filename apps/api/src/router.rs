use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use auth_cell::auth_routes;
use booking_cell::booking_routes;
use chat_cell::{chat_routes, ConversationHub};
use prescription_cell::prescription_routes;
use profile_cell::profile_routes;
use shared_config::AppConfig;
use video_conferencing_cell::video_conferencing_routes;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    let hub = Arc::new(ConversationHub::new());

    Router::new()
        .route("/", get(|| async { "Telecare API is running!" }))
        .route("/health", get(health))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/users", profile_routes(state.clone()))
        .nest("/bookings", booking_routes(state.clone()))
        .nest("/chat", chat_routes(state.clone(), hub))
        .nest("/prescriptions", prescription_routes(state.clone()))
        .nest("/video", video_conferencing_routes(state))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "telecare-api"
    }))
}
