// libs/chat-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;

pub const MAX_MESSAGE_LENGTH: usize = 4000;
pub const DEFAULT_PAGE_SIZE: usize = 200;
pub const MAX_PAGE_SIZE: usize = 500;

// ==============================================================================
// CONVERSATIONS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRoom {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub created_at: Option<DateTime<Utc>>,
}

impl ChatRoom {
    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.doctor_id == user_id || self.patient_id == user_id
    }

    pub fn counterpart_of(&self, user_id: Uuid) -> Option<Uuid> {
        if self.doctor_id == user_id {
            Some(self.patient_id)
        } else if self.patient_id == user_id {
            Some(self.doctor_id)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Participant {
    pub id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Room row with both participants embedded by PostgREST.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomWithParticipants {
    #[serde(flatten)]
    pub room: ChatRoom,
    pub doctor: Option<Participant>,
    pub patient: Option<Participant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub room: ChatRoom,
    pub counterpart: Option<Participant>,
}

// ==============================================================================
// MESSAGES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub id: Uuid,
    /// Database-assigned, strictly increasing per table; defines display order.
    pub seq: i64,
    pub room_id: Uuid,
    pub sender_id: Uuid,
    pub message: String,
    pub created_at: Option<DateTime<Utc>>,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartConversationRequest {
    pub counterpart_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagesQuery {
    pub after_seq: Option<i64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscribeQuery {
    /// Browsers cannot set headers on a WebSocket handshake.
    pub access_token: Option<String>,
}

/// Frames pushed to WebSocket subscribers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedEvent {
    Message { message: ChatMessage },
    Error { error: String },
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum ChatError {
    #[error("Conversation not found")]
    RoomNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Not a participant of this conversation")]
    NotParticipant,

    #[error("A conversation needs exactly one doctor and one patient: {0}")]
    InvalidPair(String),

    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("Message exceeds {max} characters")]
    MessageTooLong { max: usize },

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::RoomNotFound | ChatError::UserNotFound => AppError::NotFound(err.to_string()),
            ChatError::NotParticipant => AppError::Forbidden(err.to_string()),
            ChatError::InvalidPair(_) | ChatError::EmptyMessage | ChatError::MessageTooLong { .. } => {
                AppError::BadRequest(err.to_string())
            }
            ChatError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
