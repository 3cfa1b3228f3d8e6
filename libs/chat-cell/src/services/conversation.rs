// libs/chat-cell/src/services/conversation.rs
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::profile::{Role, UserProfile};

use crate::models::{
    ChatError, ChatMessage, ChatRoom, ConversationSummary, RoomWithParticipants,
    DEFAULT_PAGE_SIZE, MAX_MESSAGE_LENGTH, MAX_PAGE_SIZE,
};
use crate::services::feed::MessageSource;
use crate::services::hub::ConversationHub;

const ROOM_SELECT: &str = "*,doctor:users!chat_rooms_doctor_id_fkey(id,first_name,last_name),patient:users!chat_rooms_patient_id_fkey(id,first_name,last_name)";

pub struct ChatService {
    supabase: Arc<SupabaseClient>,
    hub: Arc<ConversationHub>,
}

impl ChatService {
    pub fn new(config: &AppConfig, hub: Arc<ConversationHub>) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            hub,
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>, hub: Arc<ConversationHub>) -> Self {
        Self { supabase, hub }
    }

    pub fn supabase(&self) -> Arc<SupabaseClient> {
        Arc::clone(&self.supabase)
    }

    /// Get-or-create the room for a doctor/patient pair in one upsert.
    /// Repeated and concurrent calls for the same pair return the same room.
    pub async fn start_conversation(
        &self,
        caller: &UserProfile,
        counterpart_id: Uuid,
        auth_token: &str,
    ) -> Result<ChatRoom, ChatError> {
        if counterpart_id == caller.id {
            return Err(ChatError::InvalidPair("cannot start a conversation with yourself".to_string()));
        }

        let counterpart = self.supabase
            .get_profile(counterpart_id, auth_token)
            .await
            .map_err(|e| ChatError::DatabaseError(e.to_string()))?
            .ok_or(ChatError::UserNotFound)?;

        let (doctor_id, patient_id) = match (caller.role, counterpart.role) {
            (Role::Doctor, Role::Patient) => (caller.id, counterpart.id),
            (Role::Patient, Role::Doctor) => (counterpart.id, caller.id),
            (a, b) => {
                return Err(ChatError::InvalidPair(format!("got {} and {}", a, b)));
            }
        };

        debug!("Resolving room for doctor {} and patient {}", doctor_id, patient_id);

        let rooms: Vec<ChatRoom> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/chat_rooms?on_conflict=doctor_id,patient_id",
            Some(auth_token),
            Some(json!({ "doctor_id": doctor_id, "patient_id": patient_id })),
            Some(SupabaseClient::prefer("resolution=merge-duplicates,return=representation")),
        ).await.map_err(|e| ChatError::DatabaseError(e.to_string()))?;

        let room = rooms.into_iter().next()
            .ok_or_else(|| ChatError::DatabaseError("Room upsert returned no rows".to_string()))?;

        info!("Conversation {} ready for {}", room.id, caller.id);
        Ok(room)
    }

    pub async fn list_conversations(
        &self,
        caller: &UserProfile,
        auth_token: &str,
    ) -> Result<Vec<ConversationSummary>, ChatError> {
        let path = format!(
            "/rest/v1/chat_rooms?select={}&or=(doctor_id.eq.{},patient_id.eq.{})&order=created_at.desc",
            ROOM_SELECT, caller.id, caller.id
        );

        let rows: Vec<RoomWithParticipants> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| ChatError::DatabaseError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .filter(|row| row.room.has_participant(caller.id))
            .map(|row| {
                let counterpart = if row.room.doctor_id == caller.id {
                    row.patient
                } else {
                    row.doctor
                };
                ConversationSummary { room: row.room, counterpart }
            })
            .collect())
    }

    pub async fn get_room(&self, room_id: Uuid, auth_token: &str) -> Result<ChatRoom, ChatError> {
        let path = format!("/rest/v1/chat_rooms?id=eq.{}", room_id);

        let rooms: Vec<ChatRoom> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| ChatError::DatabaseError(e.to_string()))?;

        rooms.into_iter().next().ok_or(ChatError::RoomNotFound)
    }

    /// Load the room and check that `user_id` is one of its two participants.
    pub async fn participant_room(
        &self,
        room_id: Uuid,
        user_id: Uuid,
        auth_token: &str,
    ) -> Result<ChatRoom, ChatError> {
        let room = self.get_room(room_id, auth_token).await?;

        if !room.has_participant(user_id) {
            warn!("User {} denied access to room {}", user_id, room_id);
            return Err(ChatError::NotParticipant);
        }

        Ok(room)
    }

    pub async fn list_messages(
        &self,
        user_id: Uuid,
        room_id: Uuid,
        after_seq: Option<i64>,
        limit: Option<usize>,
        auth_token: &str,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        self.participant_room(room_id, user_id, auth_token).await?;

        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        fetch_messages(&self.supabase, room_id, after_seq, limit, auth_token).await
    }

    /// Persist a message and publish it to live subscribers of the room.
    pub async fn send_message(
        &self,
        user_id: Uuid,
        room_id: Uuid,
        text: &str,
        auth_token: &str,
    ) -> Result<ChatMessage, ChatError> {
        let text = validate_message(text)?;
        self.participant_room(room_id, user_id, auth_token).await?;

        let stored = {
            let _guard = self.hub.write_guard(room_id).await;
            self.store_and_publish(user_id, room_id, text, auth_token).await
        };

        // unwatched rooms keep no channel once the send lock is free
        self.hub.release(room_id).await;

        stored
    }

    async fn store_and_publish(
        &self,
        user_id: Uuid,
        room_id: Uuid,
        text: &str,
        auth_token: &str,
    ) -> Result<ChatMessage, ChatError> {
        let inserted: Vec<ChatMessage> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/messages",
            Some(auth_token),
            Some(json!({
                "room_id": room_id,
                "sender_id": user_id,
                "message": text,
            })),
            Some(SupabaseClient::prefer("return=representation")),
        ).await.map_err(|e| ChatError::DatabaseError(e.to_string()))?;

        let message = inserted.into_iter().next()
            .ok_or_else(|| ChatError::DatabaseError("Message insert returned no rows".to_string()))?;

        let receivers = self.hub.publish(&message).await;
        debug!("Message {} (seq {}) reached {} subscribers", message.id, message.seq, receivers);

        Ok(message)
    }
}

/// Trimmed, non-empty, bounded message body.
pub fn validate_message(text: &str) -> Result<&str, ChatError> {
    let text = text.trim();

    if text.is_empty() {
        return Err(ChatError::EmptyMessage);
    }
    if text.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(ChatError::MessageTooLong { max: MAX_MESSAGE_LENGTH });
    }

    Ok(text)
}

async fn fetch_messages(
    supabase: &SupabaseClient,
    room_id: Uuid,
    after_seq: Option<i64>,
    limit: usize,
    auth_token: &str,
) -> Result<Vec<ChatMessage>, ChatError> {
    let mut path = format!(
        "/rest/v1/messages?room_id=eq.{}&order=seq.asc&limit={}",
        room_id, limit
    );
    if let Some(seq) = after_seq {
        path.push_str(&format!("&seq=gt.{}", seq));
    }

    supabase
        .request(Method::GET, &path, Some(auth_token), None)
        .await
        .map_err(|e| ChatError::DatabaseError(e.to_string()))
}

/// Message history of rooms, read with one subscriber's credentials.
pub struct RoomHistory {
    supabase: Arc<SupabaseClient>,
    auth_token: String,
}

impl RoomHistory {
    pub fn new(supabase: Arc<SupabaseClient>, auth_token: impl Into<String>) -> Self {
        Self {
            supabase,
            auth_token: auth_token.into(),
        }
    }
}

#[async_trait]
impl MessageSource for RoomHistory {
    async fn messages_after(
        &self,
        room_id: Uuid,
        after_seq: Option<i64>,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        fetch_messages(&self.supabase, room_id, after_seq, limit, &self.auth_token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_message_is_trimmed() {
        assert_eq!(validate_message("  hello doctor \n").unwrap(), "hello doctor");
    }

    #[test]
    fn test_blank_message_rejected() {
        assert_matches!(validate_message(" \t\n "), Err(ChatError::EmptyMessage));
    }

    #[test]
    fn test_length_limit_counts_characters() {
        let at_limit = "é".repeat(MAX_MESSAGE_LENGTH);
        assert!(validate_message(&at_limit).is_ok());

        let over = "a".repeat(MAX_MESSAGE_LENGTH + 1);
        assert_matches!(validate_message(&over), Err(ChatError::MessageTooLong { .. }));
    }
}
