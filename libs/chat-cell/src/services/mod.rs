pub mod conversation;
pub mod feed;
pub mod hub;

pub use conversation::{ChatService, RoomHistory};
pub use feed::{catch_up, MessageFeed, MessageSource};
pub use hub::ConversationHub;
