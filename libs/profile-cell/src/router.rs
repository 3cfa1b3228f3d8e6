use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn profile_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/me", get(handlers::get_me))
        .route("/onboard", post(handlers::onboard))
        .route("/doctors", get(handlers::list_doctors))
        .route("/search", get(handlers::search_patients))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
