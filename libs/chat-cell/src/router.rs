// libs/chat-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::ConversationHub;

/// Chat routes share one hub so every subscriber of a room sees every send.
#[derive(Clone)]
pub struct ChatState {
    pub config: Arc<AppConfig>,
    pub hub: Arc<ConversationHub>,
}

pub fn chat_routes(config: Arc<AppConfig>, hub: Arc<ConversationHub>) -> Router {
    let state = ChatState {
        config: config.clone(),
        hub,
    };

    let public_routes = Router::new()
        .route("/health", get(handlers::chat_health))
        .route("/conversations/{room_id}/ws", get(handlers::subscribe));

    let protected_routes = Router::new()
        .route("/conversations", post(handlers::start_conversation).get(handlers::list_conversations))
        .route(
            "/conversations/{room_id}/messages",
            get(handlers::list_messages).post(handlers::send_message),
        )
        .layer(middleware::from_fn_with_state(config, auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
