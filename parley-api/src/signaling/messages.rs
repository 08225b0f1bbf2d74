//! Signaling wire catalogue.
//!
//! Client requests arrive as `{event, seq?, payload}`; server pushes leave
//! as `{event, payload}`. Acks echo the request's `seq` inside an `ack`
//! event, and per-request errors travel exclusively in the ack payload as
//! `{error: ...}`. Dispatch is a match over the closed request set.

use mediasoup::prelude::*;
use serde::{Deserialize, Serialize};

use parley_core::models::{
    is_valid_meeting_code, BreakoutRoomId, ChatMessageWithSender, Meeting, MeetingStatus,
    ParticipantId, ParticipantStatus, ParticipantWithUser, Question, QuestionId, Role, UserId,
    MAX_CHAT_CONTENT_LEN, MAX_QUESTION_CONTENT_LEN,
};
use parley_core::service::{RateCategory, ReminderEvent};
use parley_core::{Error, Result};

use crate::rtc::{ExistingProducer, MediaAppType, TransportDirection};

/// Inbound frame: an event tag plus an optional ack sequence number.
#[derive(Debug, Deserialize)]
pub struct ClientEnvelope {
    #[serde(default)]
    pub seq: Option<u64>,
    #[serde(flatten)]
    pub request: ClientRequest,
}

/// Wire-level `appData` on produce.
#[derive(Debug, Clone, Deserialize)]
pub struct ProduceAppData {
    #[serde(rename = "type")]
    pub kind: MediaAppType,
}

/// One room config inside `create-breakout`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakoutConfig {
    pub name: String,
    pub participant_ids: Vec<ParticipantId>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum ClientRequest {
    #[serde(rename_all = "camelCase")]
    JoinMeeting { meeting_code: String },

    // Media negotiation
    CreateTransport {
        direction: TransportDirection,
    },
    #[serde(rename_all = "camelCase")]
    ConnectTransport {
        transport_id: TransportId,
        dtls_parameters: DtlsParameters,
    },
    #[serde(rename_all = "camelCase")]
    Produce {
        transport_id: TransportId,
        kind: MediaKind,
        rtp_parameters: RtpParameters,
        app_data: ProduceAppData,
    },
    #[serde(rename_all = "camelCase")]
    Consume {
        producer_id: ProducerId,
        rtp_capabilities: RtpCapabilities,
    },
    #[serde(rename_all = "camelCase")]
    ResumeConsumer { consumer_id: ConsumerId },
    #[serde(rename_all = "camelCase")]
    SetPreferredLayers {
        consumer_id: ConsumerId,
        spatial_layer: u8,
        temporal_layer: u8,
    },
    #[serde(rename_all = "camelCase")]
    PauseProducer { producer_id: ProducerId },
    #[serde(rename_all = "camelCase")]
    ResumeProducer { producer_id: ProducerId },
    #[serde(rename_all = "camelCase")]
    CloseProducer { producer_id: ProducerId },

    // Host admission
    #[serde(rename_all = "camelCase")]
    LobbyAdmit { participant_id: ParticipantId },
    #[serde(rename_all = "camelCase")]
    LobbyReject { participant_id: ParticipantId },
    #[serde(rename_all = "camelCase")]
    MoveToLobby { participant_id: ParticipantId },
    #[serde(rename_all = "camelCase")]
    KickParticipant { participant_id: ParticipantId },
    #[serde(rename_all = "camelCase")]
    TransferHost { new_host_id: ParticipantId },
    EndMeeting,
    InviteParticipant { email: String },

    // Chat
    SendChat { content: String },
    GetChatHistory,

    // Q&A
    AskQuestion { content: String },
    #[serde(rename_all = "camelCase")]
    UpvoteQuestion { question_id: QuestionId },
    #[serde(rename_all = "camelCase")]
    MarkAnswered { question_id: QuestionId },
    #[serde(rename_all = "camelCase")]
    PinQuestion { question_id: QuestionId },

    // Breakouts
    CreateBreakout {
        rooms: Vec<BreakoutConfig>,
        duration: Option<u64>,
    },
    CloseBreakouts,
    BroadcastToBreakouts { message: String },
}

impl ClientRequest {
    /// Event tag, for logs.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::JoinMeeting { .. } => "join-meeting",
            Self::CreateTransport { .. } => "create-transport",
            Self::ConnectTransport { .. } => "connect-transport",
            Self::Produce { .. } => "produce",
            Self::Consume { .. } => "consume",
            Self::ResumeConsumer { .. } => "resume-consumer",
            Self::SetPreferredLayers { .. } => "set-preferred-layers",
            Self::PauseProducer { .. } => "pause-producer",
            Self::ResumeProducer { .. } => "resume-producer",
            Self::CloseProducer { .. } => "close-producer",
            Self::LobbyAdmit { .. } => "lobby-admit",
            Self::LobbyReject { .. } => "lobby-reject",
            Self::MoveToLobby { .. } => "move-to-lobby",
            Self::KickParticipant { .. } => "kick-participant",
            Self::TransferHost { .. } => "transfer-host",
            Self::EndMeeting => "end-meeting",
            Self::InviteParticipant { .. } => "invite-participant",
            Self::SendChat { .. } => "send-chat",
            Self::GetChatHistory => "get-chat-history",
            Self::AskQuestion { .. } => "ask-question",
            Self::UpvoteQuestion { .. } => "upvote-question",
            Self::MarkAnswered { .. } => "mark-answered",
            Self::PinQuestion { .. } => "pin-question",
            Self::CreateBreakout { .. } => "create-breakout",
            Self::CloseBreakouts => "close-breakouts",
            Self::BroadcastToBreakouts { .. } => "broadcast-to-breakouts",
        }
    }

    /// Host-only events: HOST or CO_HOST may issue them. `transfer-host`
    /// additionally requires HOST specifically, enforced where the durable
    /// write happens.
    pub fn requires_moderator(&self) -> bool {
        matches!(
            self,
            Self::LobbyAdmit { .. }
                | Self::LobbyReject { .. }
                | Self::MoveToLobby { .. }
                | Self::KickParticipant { .. }
                | Self::TransferHost { .. }
                | Self::EndMeeting
                | Self::InviteParticipant { .. }
                | Self::MarkAnswered { .. }
                | Self::PinQuestion { .. }
                | Self::CreateBreakout { .. }
                | Self::CloseBreakouts
                | Self::BroadcastToBreakouts { .. }
        )
    }

    /// Rate-limit category. `end-meeting` counts as an admin action.
    pub fn rate_category(&self) -> RateCategory {
        match self {
            Self::CreateTransport { .. }
            | Self::ConnectTransport { .. }
            | Self::Produce { .. }
            | Self::Consume { .. }
            | Self::ResumeConsumer { .. }
            | Self::SetPreferredLayers { .. }
            | Self::PauseProducer { .. }
            | Self::ResumeProducer { .. } => RateCategory::Media,

            Self::SendChat { .. } | Self::AskQuestion { .. } | Self::UpvoteQuestion { .. } => {
                RateCategory::Chat
            }

            Self::LobbyAdmit { .. }
            | Self::LobbyReject { .. }
            | Self::MoveToLobby { .. }
            | Self::KickParticipant { .. }
            | Self::TransferHost { .. }
            | Self::EndMeeting
            | Self::InviteParticipant { .. }
            | Self::CreateBreakout { .. }
            | Self::CloseBreakouts
            | Self::BroadcastToBreakouts { .. } => RateCategory::Admin,

            _ => RateCategory::Default,
        }
    }

    /// Schema checks that do not need any resolved state.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::JoinMeeting { meeting_code } => {
                if !is_valid_meeting_code(meeting_code) {
                    return Err(Error::InvalidArgument(
                        "Invalid meeting code format".to_string(),
                    ));
                }
            }
            Self::SendChat { content } => {
                if content.is_empty() || content.chars().count() > MAX_CHAT_CONTENT_LEN {
                    return Err(Error::InvalidArgument(format!(
                        "Chat message must be 1..{MAX_CHAT_CONTENT_LEN} characters"
                    )));
                }
            }
            Self::AskQuestion { content } => {
                if content.is_empty() || content.chars().count() > MAX_QUESTION_CONTENT_LEN {
                    return Err(Error::InvalidArgument(format!(
                        "Question must be 1..{MAX_QUESTION_CONTENT_LEN} characters"
                    )));
                }
            }
            Self::InviteParticipant { email } => {
                if !email.contains('@') || email.len() > 255 {
                    return Err(Error::InvalidArgument("Invalid email address".to_string()));
                }
            }
            Self::BroadcastToBreakouts { message } => {
                if message.is_empty() || message.chars().count() > MAX_CHAT_CONTENT_LEN {
                    return Err(Error::InvalidArgument(
                        "Broadcast message must not be empty".to_string(),
                    ));
                }
            }
            Self::CreateBreakout { rooms, duration } => {
                if rooms.is_empty() || rooms.len() > 20 {
                    return Err(Error::InvalidArgument(
                        "Between 1 and 20 breakout rooms are allowed".to_string(),
                    ));
                }
                for room in rooms {
                    if room.name.is_empty() || room.name.chars().count() > 100 {
                        return Err(Error::InvalidArgument(
                            "Breakout room names must be 1..100 characters".to_string(),
                        ));
                    }
                }
                if let Some(minutes) = duration {
                    if !(1..=120).contains(minutes) {
                        return Err(Error::InvalidArgument(
                            "Breakout duration must be between 1 and 120 minutes".to_string(),
                        ));
                    }
                }
                // A participant listed twice (same or different rooms) is a
                // validation error rather than last-room-wins surprise
                let mut seen = std::collections::HashSet::new();
                for id in rooms.iter().flat_map(|r| &r.participant_ids) {
                    if !seen.insert(id) {
                        return Err(Error::InvalidArgument(format!(
                            "Participant {id} is assigned to more than one breakout room"
                        )));
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Roster entry pushed in join/admission events.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantSummary {
    pub participant_id: ParticipantId,
    pub user_id: UserId,
    pub name: String,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub status: ParticipantStatus,
}

impl From<&ParticipantWithUser> for ParticipantSummary {
    fn from(p: &ParticipantWithUser) -> Self {
        Self {
            participant_id: p.participant.id.clone(),
            user_id: p.participant.user_id.clone(),
            name: p.name.clone(),
            avatar_url: p.avatar_url.clone(),
            role: p.participant.role,
            status: p.participant.status,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingSummary {
    pub meeting_id: parley_core::models::MeetingId,
    pub code: String,
    pub title: String,
    pub host_user_id: UserId,
    pub lobby_enabled: bool,
    pub status: MeetingStatus,
}

impl From<&Meeting> for MeetingSummary {
    fn from(m: &Meeting) -> Self {
        Self {
            meeting_id: m.id.clone(),
            code: m.code.clone(),
            title: m.title.clone(),
            host_user_id: m.host_user_id.clone(),
            lobby_enabled: m.lobby_enabled,
            status: m.status,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakoutSummary {
    pub id: BreakoutRoomId,
    pub name: String,
    pub ends_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPayload {
    pub question_id: QuestionId,
    pub user_id: UserId,
    pub content: String,
    pub is_answered: bool,
    pub is_pinned: bool,
    pub upvote_count: i64,
}

impl QuestionPayload {
    pub fn from_question(q: &Question, upvote_count: i64) -> Self {
        Self {
            question_id: q.id.clone(),
            user_id: q.user_id.clone(),
            content: q.content.clone(),
            is_answered: q.is_answered,
            is_pinned: q.is_pinned,
            upvote_count,
        }
    }
}

/// Ack frame: the request's `seq` plus either result data or `{error}`.
#[derive(Debug, Clone, Serialize)]
pub struct AckPayload {
    pub seq: u64,
    #[serde(flatten)]
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum ServerEvent {
    Ack(AckPayload),

    // Admission flow
    #[serde(rename_all = "camelCase")]
    MeetingJoined {
        meeting: MeetingSummary,
        participants: Vec<ParticipantSummary>,
        router_capabilities: RtpCapabilitiesFinalized,
        existing_producers: Vec<ExistingProducer>,
    },
    #[serde(rename_all = "camelCase")]
    LobbyWaiting { meeting_title: String },
    #[serde(rename_all = "camelCase")]
    Admitted { participant_id: ParticipantId },
    LobbyRejected {},
    MovedToLobby {},
    Kicked {},
    MeetingEnded {},

    // Presence
    ParticipantJoined(ParticipantSummary),
    #[serde(rename_all = "camelCase")]
    ParticipantLeft {
        participant_id: ParticipantId,
        user_id: UserId,
    },
    LobbyParticipant(ParticipantSummary),
    #[serde(rename_all = "camelCase")]
    HostChanged {
        new_host_id: ParticipantId,
        old_host_id: ParticipantId,
    },

    // Media
    #[serde(rename_all = "camelCase")]
    NewProducer {
        participant_id: ParticipantId,
        producer_id: ProducerId,
        kind: MediaKind,
        app_type: MediaAppType,
    },
    #[serde(rename_all = "camelCase")]
    ProducerClosed {
        participant_id: ParticipantId,
        producer_id: ProducerId,
    },
    #[serde(rename_all = "camelCase")]
    ProducerPaused { producer_id: ProducerId },
    #[serde(rename_all = "camelCase")]
    ProducerResumed { producer_id: ProducerId },

    // Chat / Q&A
    NewChat(ChatMessageWithSender),
    NewQuestion(QuestionPayload),
    #[serde(rename_all = "camelCase")]
    QuestionUpvoted {
        question_id: QuestionId,
        upvote_count: i64,
    },
    #[serde(rename_all = "camelCase")]
    QuestionAnswered {
        question_id: QuestionId,
        is_answered: bool,
    },
    #[serde(rename_all = "camelCase")]
    QuestionPinned {
        question_id: QuestionId,
        is_pinned: bool,
    },

    // Breakouts
    BreakoutCreated { rooms: Vec<BreakoutSummary> },
    #[serde(rename_all = "camelCase")]
    BreakoutJoined {
        breakout_room: BreakoutSummary,
        router_capabilities: RtpCapabilitiesFinalized,
    },
    #[serde(rename_all = "camelCase")]
    BreakoutEnded {
        router_capabilities: RtpCapabilitiesFinalized,
    },
    BreakoutClosed {},
    #[serde(rename_all = "camelCase")]
    BreakoutBroadcast { message: String, from: String },

    Reminder(ReminderEvent),

    Error { message: String },
}

impl ServerEvent {
    /// Ack with result data.
    pub fn ack(seq: u64, data: serde_json::Value) -> Self {
        Self::Ack(AckPayload { seq, data })
    }

    /// Ack carrying `{error: <message>}`.
    pub fn ack_error(seq: u64, error: &Error) -> Self {
        Self::Ack(AckPayload {
            seq,
            data: serde_json::json!({ "error": error.ack_message() }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_meeting_wire_shape() {
        let frame = r#"{"event":"join-meeting","seq":1,"payload":{"meetingCode":"abc-defg-hij"}}"#;
        let envelope: ClientEnvelope = serde_json::from_str(frame).unwrap();
        assert_eq!(envelope.seq, Some(1));
        let ClientRequest::JoinMeeting { meeting_code } = envelope.request else {
            panic!("wrong variant");
        };
        assert_eq!(meeting_code, "abc-defg-hij");
    }

    #[test]
    fn test_payloadless_request_parses() {
        let envelope: ClientEnvelope =
            serde_json::from_str(r#"{"event":"end-meeting","seq":7}"#).unwrap();
        assert!(matches!(envelope.request, ClientRequest::EndMeeting));
        assert_eq!(envelope.request.event_name(), "end-meeting");
    }

    #[test]
    fn test_unknown_event_rejected() {
        assert!(serde_json::from_str::<ClientEnvelope>(
            r#"{"event":"drop-tables","payload":{}}"#
        )
        .is_err());
    }

    #[test]
    fn test_rate_categories() {
        let produce: ClientEnvelope = serde_json::from_str(
            r#"{"event":"resume-consumer","payload":{"consumerId":"11111111-1111-1111-1111-111111111111"}}"#,
        )
        .unwrap();
        assert_eq!(produce.request.rate_category(), RateCategory::Media);

        let chat: ClientEnvelope =
            serde_json::from_str(r#"{"event":"send-chat","payload":{"content":"hi"}}"#).unwrap();
        assert_eq!(chat.request.rate_category(), RateCategory::Chat);

        let end: ClientEnvelope = serde_json::from_str(r#"{"event":"end-meeting"}"#).unwrap();
        assert_eq!(end.request.rate_category(), RateCategory::Admin);

        let join: ClientEnvelope = serde_json::from_str(
            r#"{"event":"join-meeting","payload":{"meetingCode":"abc-defg-hij"}}"#,
        )
        .unwrap();
        assert_eq!(join.request.rate_category(), RateCategory::Default);
    }

    #[test]
    fn test_chat_validation() {
        let ok = ClientRequest::SendChat {
            content: "hello".to_string(),
        };
        assert!(ok.validate().is_ok());

        let empty = ClientRequest::SendChat {
            content: String::new(),
        };
        assert!(empty.validate().is_err());

        let long = ClientRequest::SendChat {
            content: "x".repeat(2001),
        };
        assert!(long.validate().is_err());
    }

    #[test]
    fn test_breakout_validation() {
        let make = |names: Vec<(&str, Vec<ParticipantId>)>, duration| ClientRequest::CreateBreakout {
            rooms: names
                .into_iter()
                .map(|(name, participant_ids)| BreakoutConfig {
                    name: name.to_string(),
                    participant_ids,
                })
                .collect(),
            duration,
        };

        let a = ParticipantId::new();
        let b = ParticipantId::new();

        assert!(make(vec![("R1", vec![a.clone(), b.clone()])], Some(30))
            .validate()
            .is_ok());

        // Duplicate participant across rooms
        assert!(make(
            vec![("R1", vec![a.clone()]), ("R2", vec![a.clone()])],
            None
        )
        .validate()
        .is_err());

        // Duration out of range
        assert!(make(vec![("R1", vec![b.clone()])], Some(0)).validate().is_err());
        assert!(make(vec![("R1", vec![b])], Some(121)).validate().is_err());

        // No rooms
        assert!(make(vec![], None).validate().is_err());
    }

    #[test]
    fn test_ack_serialization() {
        let ack = ServerEvent::ack(3, serde_json::json!({"connected": true}));
        let json = serde_json::to_value(&ack).unwrap();
        assert_eq!(json["event"], "ack");
        assert_eq!(json["payload"]["seq"], 3);
        assert_eq!(json["payload"]["connected"], true);
    }

    #[test]
    fn test_ack_error_shape() {
        let err = Error::AlreadyExists("Someone is already sharing their screen".to_string());
        let ack = ServerEvent::ack_error(9, &err);
        let json = serde_json::to_value(&ack).unwrap();
        assert_eq!(json["payload"]["seq"], 9);
        assert!(json["payload"]["error"]
            .as_str()
            .unwrap()
            .contains("already sharing"));
    }

    #[test]
    fn test_push_event_shape() {
        let push = ServerEvent::QuestionUpvoted {
            question_id: QuestionId::new(),
            upvote_count: 1,
        };
        let json = serde_json::to_value(&push).unwrap();
        assert_eq!(json["event"], "question-upvoted");
        assert_eq!(json["payload"]["upvoteCount"], 1);
    }
}
