// libs/video-conferencing-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::services::VideoCallService;

/// Join the video call of a conversation the caller participates in.
#[axum::debug_handler]
pub async fn join_conversation_call(
    State(state): State<Arc<AppConfig>>,
    Path(room_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let call_service = VideoCallService::new(&state)?;

    let response = call_service
        .join_conversation_call(user.id, room_id, auth.token())
        .await?;

    Ok(Json(json!({
        "success": true,
        "call": response
    })))
}

#[axum::debug_handler]
pub async fn video_health_check(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    if !state.is_video_conferencing_configured() {
        return Ok(Json(json!({
            "status": "not_configured",
            "video_configured": false,
            "message": "Video conferencing not configured"
        })));
    }

    let hms_healthy = VideoCallService::new(&state)?.health_check().await;

    Ok(Json(json!({
        "status": if hms_healthy { "healthy" } else { "unhealthy" },
        "video_configured": true,
        "hms_status": if hms_healthy { "connected" } else { "error" },
        "message": if hms_healthy {
            "Video conferencing system is operational"
        } else {
            "Video conferencing system has connectivity issues"
        }
    })))
}
