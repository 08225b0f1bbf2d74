use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{MeetingId, UserId};

/// Maximum accepted chat message length, enforced at validation and by the
/// column width.
pub const MAX_CHAT_CONTENT_LEN: usize = 2000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub meeting_id: MeetingId,
    pub user_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(meeting_id: MeetingId, user_id: UserId, content: String) -> Self {
        Self {
            id: super::id::generate_id(),
            meeting_id,
            user_id,
            content,
            created_at: Utc::now(),
        }
    }
}

/// Chat message joined with the sender's display name, for history payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessageWithSender {
    #[serde(flatten)]
    pub message: ChatMessage,
    pub sender_name: String,
}
