use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{MeetingId, UserId};

/// Durable invitation record, unique per `(meeting_id, email)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    pub id: String,
    pub meeting_id: MeetingId,
    pub email: String,
    pub invited_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl Invitation {
    pub fn new(meeting_id: MeetingId, email: String, invited_by: UserId) -> Self {
        Self {
            id: super::id::generate_id(),
            meeting_id,
            email,
            invited_by,
            created_at: Utc::now(),
        }
    }
}
