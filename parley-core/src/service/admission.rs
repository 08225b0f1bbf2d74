//! Admission and host state machine.
//!
//! The single writer of `participants.role`, `participants.status` and
//! `meetings.host_user_id`. Every handler that changes membership state goes
//! through here; durable rows are the source of truth and win over any
//! in-memory room state on conflict.

use tracing::info;

use crate::models::{
    Meeting, MeetingStatus, Participant, ParticipantId, ParticipantStatus, Role,
};
use crate::repository::{MeetingRepository, ParticipantRepository, UserRepository};
use crate::service::auth::Claims;
use crate::{Error, Result};

/// Result of a join attempt: either held in the lobby or admitted straight
/// into the meeting.
#[derive(Debug, Clone)]
pub enum JoinOutcome {
    Lobby {
        meeting: Meeting,
        participant: Participant,
    },
    Admitted {
        meeting: Meeting,
        participant: Participant,
    },
}

#[derive(Clone)]
pub struct AdmissionService {
    meetings: MeetingRepository,
    participants: ParticipantRepository,
    users: UserRepository,
}

impl AdmissionService {
    pub const fn new(
        meetings: MeetingRepository,
        participants: ParticipantRepository,
        users: UserRepository,
    ) -> Self {
        Self {
            meetings,
            participants,
            users,
        }
    }

    pub const fn meetings(&self) -> &MeetingRepository {
        &self.meetings
    }

    pub const fn participants(&self) -> &ParticipantRepository {
        &self.participants
    }

    pub const fn users(&self) -> &UserRepository {
        &self.users
    }

    /// Handle `join-meeting`.
    ///
    /// - the host, or anyone when the lobby is disabled, is admitted
    /// - everyone else is held in the lobby
    /// - a returning row with `left_at` set and status still in-meeting is a
    ///   reconnect and is re-admitted without a lobby hold
    /// - a removed participant stays out until a host admits them again
    pub async fn join(&self, meeting_code: &str, claims: &Claims) -> Result<JoinOutcome> {
        let meeting = self
            .meetings
            .get_by_code(meeting_code)
            .await?
            .ok_or_else(|| Error::NotFound("Meeting not found".to_string()))?;

        if meeting.status == MeetingStatus::Ended {
            return Err(Error::NotFound("Meeting has ended".to_string()));
        }

        // Refresh the identity snapshot so rosters carry current names
        let user = self.users.upsert(&claims.to_user()).await?;
        let is_host = meeting.host_user_id == user.id;

        let existing = self
            .participants
            .get_by_user_and_meeting(&user.id, &meeting.id)
            .await?;

        if let Some(participant) = existing {
            return self.rejoin(meeting, participant, is_host).await;
        }

        let (role, status) = if is_host {
            (Role::Host, ParticipantStatus::InMeeting)
        } else if meeting.lobby_enabled {
            (Role::Participant, ParticipantStatus::InLobby)
        } else {
            (Role::Participant, ParticipantStatus::InMeeting)
        };

        let participant = self
            .participants
            .create(&Participant::new(
                user.id.clone(),
                meeting.id.clone(),
                role,
                status,
            ))
            .await?;

        info!(
            meeting_code = %meeting.code,
            user_id = %user.id,
            status = %status,
            "Participant joined"
        );

        if status == ParticipantStatus::InMeeting {
            self.meetings.mark_live(&meeting.id).await?;
            Ok(JoinOutcome::Admitted {
                meeting,
                participant,
            })
        } else {
            Ok(JoinOutcome::Lobby {
                meeting,
                participant,
            })
        }
    }

    async fn rejoin(
        &self,
        meeting: Meeting,
        participant: Participant,
        is_host: bool,
    ) -> Result<JoinOutcome> {
        match participant.status {
            ParticipantStatus::Removed => {
                Err(Error::PermissionDenied(
                    "You were removed from this meeting".to_string(),
                ))
            }
            ParticipantStatus::InLobby if !is_host => Ok(JoinOutcome::Lobby {
                meeting,
                participant,
            }),
            _ => {
                // Reconnect path: clear the departure stamp, and fold a
                // stale in-breakout status back to the main scope since the
                // peer's media state was torn down with the old connection.
                self.participants.clear_left(&participant.id).await?;
                let participant = if participant.status == ParticipantStatus::InMeeting {
                    let mut p = participant;
                    p.left_at = None;
                    p
                } else {
                    self.participants
                        .set_status(&participant.id, ParticipantStatus::InMeeting)
                        .await?;
                    self.participants
                        .get_by_id(&participant.id)
                        .await?
                        .ok_or_else(|| Error::NotFound("Participant not found".to_string()))?
                };
                self.meetings.mark_live(&meeting.id).await?;
                Ok(JoinOutcome::Admitted {
                    meeting,
                    participant,
                })
            }
        }
    }

    /// Host admits a lobby participant: IN_LOBBY -> IN_MEETING.
    pub async fn admit(&self, target: &ParticipantId) -> Result<Participant> {
        let participant = self.require(target).await?;
        if participant.status != ParticipantStatus::InLobby {
            return Err(Error::InvalidState(
                "Participant is not waiting in the lobby".to_string(),
            ));
        }

        self.participants
            .set_status(target, ParticipantStatus::InMeeting)
            .await?;
        self.meetings.mark_live(&participant.meeting_id).await?;

        info!(participant_id = %target, "Admitted from lobby");
        self.require(target).await
    }

    /// Host rejects a lobby participant: IN_LOBBY -> REMOVED.
    pub async fn reject(&self, target: &ParticipantId) -> Result<Participant> {
        let participant = self.require(target).await?;
        if participant.status != ParticipantStatus::InLobby {
            return Err(Error::InvalidState(
                "Participant is not waiting in the lobby".to_string(),
            ));
        }

        self.participants
            .set_status(target, ParticipantStatus::Removed)
            .await?;

        info!(participant_id = %target, "Rejected from lobby");
        self.require(target).await
    }

    /// Host sends a participant back to the lobby: IN_MEETING -> IN_LOBBY.
    /// The host cannot be targeted.
    pub async fn move_to_lobby(&self, target: &ParticipantId) -> Result<Participant> {
        let participant = self.require(target).await?;
        if participant.role == Role::Host {
            return Err(Error::PermissionDenied(
                "The host cannot be moved to the lobby".to_string(),
            ));
        }
        if participant.status != ParticipantStatus::InMeeting {
            return Err(Error::InvalidState(
                "Participant is not in the meeting".to_string(),
            ));
        }

        self.participants
            .set_status(target, ParticipantStatus::InLobby)
            .await?;

        info!(participant_id = %target, "Moved to lobby");
        self.require(target).await
    }

    /// Host removes a participant: -> REMOVED. The host cannot be targeted.
    pub async fn kick(&self, target: &ParticipantId) -> Result<Participant> {
        let participant = self.require(target).await?;
        if participant.role == Role::Host {
            return Err(Error::PermissionDenied(
                "The host cannot be removed".to_string(),
            ));
        }

        self.participants
            .set_status(target, ParticipantStatus::Removed)
            .await?;

        info!(participant_id = %target, "Kicked");
        self.require(target).await
    }

    /// Transfer the host role. The caller must hold HOST (enforced at
    /// dispatch); the demote/promote/meeting update is one transaction.
    pub async fn transfer_host(
        &self,
        caller: &Participant,
        new_host: &ParticipantId,
    ) -> Result<Participant> {
        if caller.role != Role::Host {
            return Err(Error::PermissionDenied(
                "Only the host can transfer the host role".to_string(),
            ));
        }
        if &caller.id == new_host {
            return Err(Error::InvalidArgument(
                "Cannot transfer the host role to yourself".to_string(),
            ));
        }

        self.participants
            .transfer_host(&caller.meeting_id, new_host)
            .await?;

        info!(
            old_host = %caller.id,
            new_host = %new_host,
            "Host transferred"
        );
        self.require(new_host).await
    }

    /// Host ends the meeting.
    pub async fn end_meeting(&self, meeting: &Meeting) -> Result<()> {
        self.meetings.mark_ended(&meeting.id).await?;
        info!(meeting_code = %meeting.code, "Meeting ended");
        Ok(())
    }

    /// Disconnect cleanup: stamp `left_at`, keep `status` untouched so a
    /// reconnect re-enters without a lobby hold.
    pub async fn mark_disconnected(&self, participant_id: &ParticipantId) -> Result<()> {
        self.participants.mark_left(participant_id).await
    }

    async fn require(&self, participant_id: &ParticipantId) -> Result<Participant> {
        self.participants
            .get_by_id(participant_id)
            .await?
            .ok_or_else(|| Error::NotFound("Participant not found".to_string()))
    }
}

#[cfg(test)]
mod tests {

    #[tokio::test]
    #[ignore = "Requires database"]
    async fn test_lobby_hold_and_admit_flow() {
        // Integration test placeholder: E2E lobby admit is covered by the
        // signaling-level tests against a live database.
    }

    #[tokio::test]
    #[ignore = "Requires database"]
    async fn test_removed_participant_cannot_rejoin() {
        // Integration test placeholder
    }
}
