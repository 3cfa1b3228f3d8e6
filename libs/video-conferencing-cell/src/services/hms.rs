// libs/video-conferencing-cell/src/services/hms.rs
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error, info};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::models::{
    AppTokenClaims, CallRole, HmsRoom, HmsRoomRequest, ManagementTokenClaims, TokenType,
    VideoConferencingError, APP_TOKEN_TTL_HOURS, MANAGEMENT_TOKEN_TTL_MINUTES, TOKEN_VERSION,
};

/// 100ms REST client and token issuer.
/// Based on: https://www.100ms.live/docs/server-side/v2/introduction/basics
pub struct HmsClient {
    client: Client,
    access_key: String,
    app_secret: String,
    base_url: String,
    template_id: Option<String>,
}

impl HmsClient {
    pub fn new(config: &AppConfig) -> Result<Self, VideoConferencingError> {
        if !config.is_video_conferencing_configured() {
            return Err(VideoConferencingError::NotConfigured);
        }

        Ok(Self {
            client: Client::new(),
            access_key: config.hms_access_key.clone(),
            app_secret: config.hms_app_secret.clone(),
            base_url: config.hms_api_base_url.trim_end_matches('/').to_string(),
            template_id: config.hms_template_id.clone(),
        })
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, VideoConferencingError> {
        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());

        Ok(encode(&header, claims, &EncodingKey::from_secret(self.app_secret.as_bytes()))?)
    }

    pub fn management_token(&self) -> Result<String, VideoConferencingError> {
        let now = Utc::now();

        self.sign(&ManagementTokenClaims {
            access_key: self.access_key.clone(),
            token_type: TokenType::Management,
            version: TOKEN_VERSION,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + Duration::minutes(MANAGEMENT_TOKEN_TTL_MINUTES)).timestamp(),
        })
    }

    /// SDK token for `user_id` to join `hms_room_id` with `role`.
    pub fn app_token(
        &self,
        hms_room_id: &str,
        user_id: Uuid,
        role: CallRole,
    ) -> Result<(String, DateTime<Utc>), VideoConferencingError> {
        let now = Utc::now();
        let expires_at = now + Duration::hours(APP_TOKEN_TTL_HOURS);

        let token = self.sign(&AppTokenClaims {
            access_key: self.access_key.clone(),
            room_id: hms_room_id.to_string(),
            user_id: user_id.to_string(),
            role,
            token_type: TokenType::App,
            version: TOKEN_VERSION,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
        })?;

        Ok((token, expires_at))
    }

    /// Create the room, or return it if one with this name already exists.
    /// POST /rooms is create-or-update keyed by name.
    pub async fn ensure_room(
        &self,
        name: &str,
        description: &str,
    ) -> Result<HmsRoom, VideoConferencingError> {
        let url = format!("{}/rooms", self.base_url);

        let request_body = HmsRoomRequest {
            name: name.to_string(),
            description: description.to_string(),
            template_id: self.template_id.clone(),
        };

        debug!("Ensuring 100ms room {} at {}", name, url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.management_token()?)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            error!("100ms room request failed: {} - {}", status, response_text);
            return Err(VideoConferencingError::HmsApiError {
                message: format!("HTTP {}: {}", status, response_text),
            });
        }

        let room: HmsRoom = serde_json::from_str(&response_text)
            .map_err(|e| VideoConferencingError::HmsApiError {
                message: format!("Failed to parse room response: {}", e),
            })?;

        if room.enabled == Some(false) {
            return Err(VideoConferencingError::HmsApiError {
                message: format!("Room {} is disabled", room.name),
            });
        }

        info!("100ms room {} ready ({})", room.name, room.id);
        Ok(room)
    }

    pub async fn health_check(&self) -> Result<bool, VideoConferencingError> {
        let url = format!("{}/rooms?limit=1", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.management_token()?)
            .send()
            .await?;

        Ok(response.status().is_success())
    }
}
