// libs/video-conferencing-cell/src/services/call.rs
use std::sync::Arc;

use reqwest::Method;
use tracing::{info, warn};
use uuid::Uuid;

use chat_cell::ChatRoom;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{CallRole, JoinCallResponse, VideoConferencingError, ROOM_NAME_PREFIX};
use crate::services::hms::HmsClient;

pub struct VideoCallService {
    hms: HmsClient,
    supabase: Arc<SupabaseClient>,
}

impl VideoCallService {
    pub fn new(config: &AppConfig) -> Result<Self, VideoConferencingError> {
        Ok(Self {
            hms: HmsClient::new(config)?,
            supabase: Arc::new(SupabaseClient::new(config)),
        })
    }

    pub fn room_name(conversation_id: Uuid) -> String {
        format!("{}{}", ROOM_NAME_PREFIX, conversation_id)
    }

    /// Role follows the caller's side of the conversation.
    pub fn role_for(room: &ChatRoom, user_id: Uuid) -> Option<CallRole> {
        if room.doctor_id == user_id {
            Some(CallRole::Host)
        } else if room.patient_id == user_id {
            Some(CallRole::Guest)
        } else {
            None
        }
    }

    async fn conversation(
        &self,
        conversation_id: Uuid,
        auth_token: &str,
    ) -> Result<ChatRoom, VideoConferencingError> {
        let path = format!("/rest/v1/chat_rooms?id=eq.{}", conversation_id);

        let rooms: Vec<ChatRoom> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| VideoConferencingError::DatabaseError { message: e.to_string() })?;

        rooms.into_iter().next().ok_or(VideoConferencingError::ConversationNotFound)
    }

    pub async fn join_conversation_call(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
        auth_token: &str,
    ) -> Result<JoinCallResponse, VideoConferencingError> {
        let conversation = self.conversation(conversation_id, auth_token).await?;

        let role = Self::role_for(&conversation, user_id).ok_or_else(|| {
            warn!("User {} is not part of conversation {}", user_id, conversation_id);
            VideoConferencingError::Unauthorized
        })?;

        let room_name = Self::room_name(conversation_id);
        let hms_room = self.hms
            .ensure_room(&room_name, "Doctor-patient consultation")
            .await?;

        let (auth_token, expires_at) = self.hms.app_token(&hms_room.id, user_id, role)?;

        info!("User {} joining call {} as {}", user_id, room_name, role);

        Ok(JoinCallResponse {
            conversation_id,
            hms_room_id: hms_room.id,
            room_name,
            auth_token,
            role,
            expires_at,
        })
    }

    pub async fn health_check(&self) -> bool {
        self.hms.health_check().await.unwrap_or(false)
    }
}
