use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::id::{MeetingId, ReminderId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    Email,
    InApp,
}

impl ReminderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::InApp => "in_app",
        }
    }
}

impl FromStr for ReminderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Self::Email),
            "in_app" => Ok(Self::InApp),
            _ => Err(format!("Unknown reminder kind: {s}")),
        }
    }
}

/// Scheduled reminder. `sent` stays false on partial failure so the next
/// scheduler tick retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: ReminderId,
    pub meeting_id: MeetingId,
    pub kind: ReminderKind,
    pub minutes_before: i32,
    pub trigger_at: DateTime<Utc>,
    pub sent: bool,
    pub created_at: DateTime<Utc>,
}
