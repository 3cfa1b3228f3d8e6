use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{ChatError, ChatMessage, MAX_PAGE_SIZE};

/// Where a subscriber re-reads history after falling behind the live channel.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Messages of `room_id` with `seq > after_seq`, ascending, at most `limit`.
    async fn messages_after(
        &self,
        room_id: Uuid,
        after_seq: Option<i64>,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, ChatError>;
}

/// Per-subscriber delivery cursor.
///
/// A message is delivered only if its `seq` is above everything delivered so
/// far, so backlog and live traffic can overlap without duplicates.
#[derive(Debug, Clone, Default)]
pub struct MessageFeed {
    last_seq: Option<i64>,
}

impl MessageFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_after(seq: i64) -> Self {
        Self { last_seq: Some(seq) }
    }

    pub fn last_seq(&self) -> Option<i64> {
        self.last_seq
    }

    /// Returns true if `message` should be delivered.
    pub fn accept(&mut self, message: &ChatMessage) -> bool {
        if self.last_seq.is_some_and(|last| message.seq <= last) {
            return false;
        }
        self.last_seq = Some(message.seq);
        true
    }

    pub fn accept_batch(&mut self, mut batch: Vec<ChatMessage>) -> Vec<ChatMessage> {
        batch.sort_by_key(|m| m.seq);
        batch.retain(|m| self.accept(m));
        batch
    }
}

/// Pull everything past the feed's cursor from `source`, page by page.
pub async fn catch_up<S>(
    source: &S,
    feed: &mut MessageFeed,
    room_id: Uuid,
) -> Result<Vec<ChatMessage>, ChatError>
where
    S: MessageSource + ?Sized,
{
    let mut delivered = Vec::new();

    loop {
        let page = source.messages_after(room_id, feed.last_seq(), MAX_PAGE_SIZE).await?;
        let full_page = page.len() >= MAX_PAGE_SIZE;

        let accepted = feed.accept_batch(page);
        let progressed = !accepted.is_empty();
        delivered.extend(accepted);

        if !full_page || !progressed {
            break;
        }
    }

    Ok(delivered)
}
