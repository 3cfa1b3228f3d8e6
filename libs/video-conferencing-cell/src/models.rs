// libs/video-conferencing-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;

pub const ROOM_NAME_PREFIX: &str = "telecare-";
pub const APP_TOKEN_TTL_HOURS: i64 = 24;
pub const MANAGEMENT_TOKEN_TTL_MINUTES: i64 = 10;
pub const TOKEN_VERSION: u8 = 2;

// ==============================================================================
// ROLES
// ==============================================================================

/// 100ms template role. Doctors host, patients join as guests.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CallRole {
    Host,
    Guest,
}

impl fmt::Display for CallRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallRole::Host => write!(f, "host"),
            CallRole::Guest => write!(f, "guest"),
        }
    }
}

// ==============================================================================
// TOKEN CLAIMS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    App,
    Management,
}

/// Claims of the token a client SDK presents to join a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppTokenClaims {
    pub access_key: String,
    pub room_id: String,
    pub user_id: String,
    pub role: CallRole,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub version: u8,
    pub jti: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

/// Claims of the token the backend uses against the 100ms REST API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagementTokenClaims {
    pub access_key: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub version: u8,
    pub jti: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

// ==============================================================================
// 100MS API MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct HmsRoomRequest {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HmsRoom {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub enabled: Option<bool>,
}

// ==============================================================================
// RESPONSES
// ==============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct JoinCallResponse {
    pub conversation_id: Uuid,
    pub hms_room_id: String,
    pub room_name: String,
    pub auth_token: String,
    pub role: CallRole,
    pub expires_at: DateTime<Utc>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum VideoConferencingError {
    #[error("Video conferencing not configured")]
    NotConfigured,

    #[error("Conversation not found")]
    ConversationNotFound,

    #[error("User not authorized for this call")]
    Unauthorized,

    #[error("100ms API error: {message}")]
    HmsApiError { message: String },

    #[error("Token error: {message}")]
    TokenError { message: String },

    #[error("Database error: {message}")]
    DatabaseError { message: String },
}

impl From<reqwest::Error> for VideoConferencingError {
    fn from(err: reqwest::Error) -> Self {
        VideoConferencingError::HmsApiError {
            message: err.to_string(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for VideoConferencingError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        VideoConferencingError::TokenError {
            message: err.to_string(),
        }
    }
}

impl From<VideoConferencingError> for AppError {
    fn from(err: VideoConferencingError) -> Self {
        match err {
            VideoConferencingError::NotConfigured => AppError::Internal(err.to_string()),
            VideoConferencingError::ConversationNotFound => AppError::NotFound(err.to_string()),
            VideoConferencingError::Unauthorized => AppError::Forbidden(err.to_string()),
            VideoConferencingError::HmsApiError { message } => AppError::ExternalService(message),
            VideoConferencingError::TokenError { message } => AppError::Internal(message),
            VideoConferencingError::DatabaseError { message } => AppError::Database(message),
        }
    }
}
