// libs/prescription-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::profile::load_caller_profile;

use crate::models::{IssuePrescriptionRequest, UpdateStatusRequest};
use crate::services::PrescriptionService;

#[axum::debug_handler]
pub async fn issue_prescription(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<IssuePrescriptionRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let supabase = Arc::new(SupabaseClient::new(&state));
    let caller = load_caller_profile(&supabase, &user, auth.token()).await?;

    let prescription = PrescriptionService::with_client(supabase)
        .issue(&caller, request, auth.token())
        .await?;

    Ok((StatusCode::CREATED, Json(json!({
        "success": true,
        "prescription": prescription
    }))))
}

#[axum::debug_handler]
pub async fn list_prescriptions(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let supabase = Arc::new(SupabaseClient::new(&state));
    let caller = load_caller_profile(&supabase, &user, auth.token()).await?;

    let prescriptions = PrescriptionService::with_client(supabase)
        .list(&caller, auth.token())
        .await?;

    Ok(Json(json!({
        "role": caller.role,
        "prescriptions": prescriptions,
        "total": prescriptions.len()
    })))
}

#[axum::debug_handler]
pub async fn get_prescription(
    State(state): State<Arc<AppConfig>>,
    Path(prescription_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let supabase = Arc::new(SupabaseClient::new(&state));
    let caller = load_caller_profile(&supabase, &user, auth.token()).await?;

    let prescription = PrescriptionService::with_client(supabase)
        .get(&caller, prescription_id, auth.token())
        .await?;

    Ok(Json(json!(prescription)))
}

#[axum::debug_handler]
pub async fn update_status(
    State(state): State<Arc<AppConfig>>,
    Path(prescription_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let supabase = Arc::new(SupabaseClient::new(&state));
    let caller = load_caller_profile(&supabase, &user, auth.token()).await?;

    let prescription = PrescriptionService::with_client(supabase)
        .update_status(&caller, prescription_id, request.status, auth.token())
        .await?;

    Ok(Json(json!({
        "success": true,
        "prescription": prescription
    })))
}
