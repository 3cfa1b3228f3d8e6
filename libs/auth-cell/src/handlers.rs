use std::sync::Arc;

use axum::{
    extract::{Json, Query, State},
    http::{HeaderMap, StatusCode},
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::TokenResponse;
use shared_models::error::AppError;
use shared_utils::extractor::bearer_token;
use shared_utils::jwt;

use crate::models::{CallbackQuery, LoginRequest, MagicLinkRequest, SignupRequest};
use crate::services::AuthService;

pub async fn validate_token(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token");

    let token = bearer_token(&headers)?;
    let user = jwt::validate_token(token, &config.supabase_jwt_secret).map_err(AppError::Auth)?;

    Ok(Json(TokenResponse {
        valid: true,
        user_id: user.id,
        email: user.email,
        role: user.role,
    }))
}

pub async fn verify_token(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    debug!("Verifying token");

    let token = bearer_token(&headers)?;
    let valid = jwt::validate_token(token, &config.supabase_jwt_secret).is_ok();

    Ok(Json(json!({ "valid": valid })))
}

pub async fn signup(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let response = AuthService::new(&config).signup(request).await?;

    Ok((StatusCode::CREATED, Json(json!(response))))
}

pub async fn login(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let session = AuthService::new(&config).login(request).await?;

    Ok(Json(json!({ "session": session })))
}

pub async fn magic_link(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<MagicLinkRequest>,
) -> Result<Json<Value>, AppError> {
    let response = AuthService::new(&config).magic_link(&request.email).await?;

    Ok(Json(json!(response)))
}

pub async fn callback(
    State(config): State<Arc<AppConfig>>,
    Query(query): Query<CallbackQuery>,
) -> Result<Json<Value>, AppError> {
    let response = AuthService::new(&config)
        .callback(query.code.as_deref(), query.code_verifier.as_deref())
        .await?;

    Ok(Json(json!(response)))
}

pub async fn session(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let user = AuthService::new(&config).session(auth.token()).await?;

    Ok(Json(json!({ "user": user })))
}

pub async fn logout(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    AuthService::new(&config).logout(auth.token()).await?;

    Ok(Json(json!({ "success": true })))
}
