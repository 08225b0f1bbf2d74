use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::id::{MeetingId, UserId};

/// Meeting lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingStatus {
    /// Created, nobody admitted yet
    Scheduled,
    /// At least one participant was admitted
    Live,
    /// Host ended it, or the idle-meeting GC swept it
    Ended,
}

impl MeetingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Live => "live",
            Self::Ended => "ended",
        }
    }
}

impl FromStr for MeetingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "live" => Ok(Self::Live),
            "ended" => Ok(Self::Ended),
            _ => Err(format!("Unknown meeting status: {s}")),
        }
    }
}

impl std::fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub id: MeetingId,
    /// Human-shareable code, `xxx-xxxx-xxx`
    pub code: String,
    pub title: String,
    pub host_user_id: UserId,
    pub lobby_enabled: bool,
    pub status: MeetingStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Meeting {
    /// An instant meeting has no schedule; idle ones are garbage-collected.
    pub const fn is_instant(&self) -> bool {
        self.scheduled_at.is_none()
    }

    pub fn is_ended(&self) -> bool {
        self.status == MeetingStatus::Ended
    }
}
