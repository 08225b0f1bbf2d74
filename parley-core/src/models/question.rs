use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{MeetingId, QuestionId, UserId};

/// Maximum accepted question length.
pub const MAX_QUESTION_CONTENT_LEN: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub meeting_id: MeetingId,
    pub user_id: UserId,
    pub content: String,
    pub is_answered: bool,
    pub is_pinned: bool,
    pub created_at: DateTime<Utc>,
}

impl Question {
    pub fn new(meeting_id: MeetingId, user_id: UserId, content: String) -> Self {
        Self {
            id: QuestionId::new(),
            meeting_id,
            user_id,
            content,
            is_answered: false,
            is_pinned: false,
            created_at: Utc::now(),
        }
    }
}

/// Outcome of an upvote toggle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UpvoteResult {
    /// Upvote count after the toggle
    pub upvote_count: i64,
    /// Whether the toggling user now has an upvote on the question
    pub has_upvoted: bool,
}
