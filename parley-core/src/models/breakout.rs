use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{BreakoutRoomId, MeetingId};

/// Durable breakout room record. `is_active` flips to false when the set is
/// closed (manually or by the auto-close timer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakoutRoom {
    pub id: BreakoutRoomId,
    pub meeting_id: MeetingId,
    pub name: String,
    pub is_active: bool,
    pub ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl BreakoutRoom {
    pub fn new(meeting_id: MeetingId, name: String, ends_at: Option<DateTime<Utc>>) -> Self {
        Self {
            id: BreakoutRoomId::new(),
            meeting_id,
            name,
            is_active: true,
            ends_at,
            created_at: Utc::now(),
        }
    }
}
