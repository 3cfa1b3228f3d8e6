use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex, OwnedMutexGuard, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::models::ChatMessage;

const DEFAULT_CAPACITY: usize = 256;

struct RoomChannel {
    sender: broadcast::Sender<ChatMessage>,
    write_lock: Arc<Mutex<()>>,
}

/// In-process registry of per-conversation broadcast channels.
///
/// Sends to one room are serialized through the room's write lock, so the
/// order in which messages are published equals their `seq` order.
pub struct ConversationHub {
    rooms: RwLock<HashMap<Uuid, RoomChannel>>,
    capacity: usize,
}

impl ConversationHub {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    fn open_channel(&self) -> RoomChannel {
        let (sender, _) = broadcast::channel(self.capacity);
        RoomChannel {
            sender,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn subscribe(&self, room_id: Uuid) -> broadcast::Receiver<ChatMessage> {
        let mut rooms = self.rooms.write().await;
        let channel = rooms.entry(room_id).or_insert_with(|| self.open_channel());

        debug!("New subscriber for room {}", room_id);
        channel.sender.subscribe()
    }

    /// Held across insert-then-publish for one room.
    pub async fn write_guard(&self, room_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut rooms = self.rooms.write().await;
            let channel = rooms.entry(room_id).or_insert_with(|| self.open_channel());
            Arc::clone(&channel.write_lock)
        };

        lock.lock_owned().await
    }

    /// Returns the number of subscribers the message reached.
    pub async fn publish(&self, message: &ChatMessage) -> usize {
        let rooms = self.rooms.read().await;

        match rooms.get(&message.room_id) {
            Some(channel) => match channel.sender.send(message.clone()) {
                Ok(receivers) => receivers,
                Err(_) => {
                    debug!("No live subscribers for room {}", message.room_id);
                    0
                }
            },
            None => 0,
        }
    }

    /// Drop the room's channel once nobody listens or writes.
    pub async fn release(&self, room_id: Uuid) {
        let mut rooms = self.rooms.write().await;

        let idle = rooms.get(&room_id).is_some_and(|channel| {
            channel.sender.receiver_count() == 0 && Arc::strong_count(&channel.write_lock) == 1
        });

        if idle {
            rooms.remove(&room_id);
            debug!("Pruned idle channel for room {}", room_id);
        }
    }

    pub async fn subscriber_count(&self, room_id: Uuid) -> usize {
        let rooms = self.rooms.read().await;
        rooms.get(&room_id).map_or(0, |c| c.sender.receiver_count())
    }

    pub async fn active_rooms(&self) -> Vec<Uuid> {
        let rooms = self.rooms.read().await;
        rooms.keys().copied().collect()
    }
}

impl Default for ConversationHub {
    fn default() -> Self {
        Self::new()
    }
}
