use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::id::{BreakoutRoomId, MeetingId, ParticipantId, UserId};

/// Role within a meeting. Exactly one participant per meeting holds `Host`;
/// `transfer-host` is the only operation that moves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Host,
    CoHost,
    Participant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::CoHost => "co_host",
            Self::Participant => "participant",
        }
    }

    /// Host-only signaling events accept either of these.
    pub fn can_moderate(&self) -> bool {
        matches!(self, Self::Host | Self::CoHost)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "host" => Ok(Self::Host),
            "co_host" => Ok(Self::CoHost),
            "participant" => Ok(Self::Participant),
            _ => Err(format!("Unknown role: {s}")),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Durable participant status. The admission state machine is the only
/// writer; in-memory room state is a cache of the live subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    InLobby,
    InMeeting,
    InBreakout,
    Removed,
}

impl ParticipantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InLobby => "in_lobby",
            Self::InMeeting => "in_meeting",
            Self::InBreakout => "in_breakout",
            Self::Removed => "removed",
        }
    }
}

impl FromStr for ParticipantStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_lobby" => Ok(Self::InLobby),
            "in_meeting" => Ok(Self::InMeeting),
            "in_breakout" => Ok(Self::InBreakout),
            "removed" => Ok(Self::Removed),
            _ => Err(format!("Unknown participant status: {s}")),
        }
    }
}

impl std::fmt::Display for ParticipantStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Durable membership record, unique per `(user_id, meeting_id)`.
///
/// Invariant: `breakout_room_id` is non-null iff `status = InBreakout`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub user_id: UserId,
    pub meeting_id: MeetingId,
    pub role: Role,
    pub status: ParticipantStatus,
    pub breakout_room_id: Option<BreakoutRoomId>,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
}

impl Participant {
    pub fn new(user_id: UserId, meeting_id: MeetingId, role: Role, status: ParticipantStatus) -> Self {
        Self {
            id: ParticipantId::new(),
            user_id,
            meeting_id,
            role,
            status,
            breakout_room_id: None,
            joined_at: Utc::now(),
            left_at: None,
        }
    }

    pub fn is_removed(&self) -> bool {
        self.status == ParticipantStatus::Removed
    }

    /// A previously seen row with `left_at` set and status still `InMeeting`
    /// is a reconnect, not a fresh join: it re-enters without a lobby hold.
    pub fn is_reconnect(&self) -> bool {
        self.left_at.is_some() && self.status == ParticipantStatus::InMeeting
    }
}

/// Participant joined with the user columns, for roster payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantWithUser {
    #[serde(flatten)]
    pub participant: Participant,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Host, Role::CoHost, Role::Participant] {
            assert_eq!(Role::from_str(role.as_str()).unwrap(), role);
        }
        assert!(Role::from_str("owner").is_err());
    }

    #[test]
    fn test_moderation_rights() {
        assert!(Role::Host.can_moderate());
        assert!(Role::CoHost.can_moderate());
        assert!(!Role::Participant.can_moderate());
    }

    #[test]
    fn test_reconnect_detection() {
        let mut p = Participant::new(
            UserId::new(),
            MeetingId::new(),
            Role::Participant,
            ParticipantStatus::InMeeting,
        );
        assert!(!p.is_reconnect());

        p.left_at = Some(Utc::now());
        assert!(p.is_reconnect());

        p.status = ParticipantStatus::InLobby;
        assert!(!p.is_reconnect());
    }
}
