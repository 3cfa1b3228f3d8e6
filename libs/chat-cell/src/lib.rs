//! # Chat Cell
//!
//! One-to-one doctor/patient messaging.
//!
//! A conversation (`chat_rooms` row) is unique per `(doctor_id, patient_id)`
//! and is resolved with a single upsert, so repeated or concurrent "start chat"
//! calls land on the same room. Messages carry a database-assigned `seq` that
//! defines their order; subscribers receive each message once, in `seq` order.
//!
//! ```text
//! +--------------------------------------------------------+
//! |  handlers.rs        |  HTTP + WebSocket endpoints      |
//! |  router.rs          |  Route definitions, ChatState    |
//! |  models.rs          |  Rooms, messages, errors         |
//! |  services/          |                                  |
//! |    conversation.rs  |  Supabase queries, send path     |
//! |    hub.rs           |  Per-room broadcast channels     |
//! |    feed.rs          |  Ordered, de-duplicated delivery |
//! +--------------------------------------------------------+
//! ```

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{ChatError, ChatMessage, ChatRoom, ConversationSummary, FeedEvent};
pub use router::{chat_routes, ChatState};
pub use services::{ChatService, ConversationHub, MessageFeed, MessageSource};
