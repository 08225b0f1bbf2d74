//! Request dispatch.
//!
//! Every inbound request runs the same pipeline: rate check (silent drop on
//! overflow), binding check, resource resolution, authorization against the
//! durable participant row, input validation, action, then ack and fan-out.
//! Authorization always re-reads the durable row; if a host action and a
//! disconnect race, the durable state wins.

use mediasoup::consumer::ConsumerLayers;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use parley_core::models::{
    ChatMessage, ConnId, Invitation, Meeting, MeetingId, Participant, ParticipantId,
    ParticipantStatus, ParticipantWithUser, Question, QuestionId,
};
use parley_core::service::{Claims, JoinOutcome};
use parley_core::{Error, Result};

use crate::breakout;
use crate::hub::Group;
use crate::rtc::{MediaRoom, PeerIdentity, Scope};
use crate::signaling::messages::{
    ClientEnvelope, ClientRequest, MeetingSummary, ParticipantSummary, ServerEvent,
};
use crate::state::AppState;

/// What a connection is bound to after `join-meeting`.
#[derive(Debug, Clone)]
pub struct Binding {
    pub meeting_id: MeetingId,
    pub meeting_code: String,
    pub participant_id: ParticipantId,
}

/// Per-connection dispatch context.
pub struct ConnectionCtx {
    pub conn_id: ConnId,
    pub claims: Claims,
    pub binding: Option<Binding>,
}

impl ConnectionCtx {
    pub fn new(conn_id: ConnId, claims: Claims) -> Self {
        Self {
            conn_id,
            claims,
            binding: None,
        }
    }
}

/// Run one request through the pipeline. Returns the ack to enqueue, or
/// `None` when no ack is owed (rate-limited, or the caller sent no `seq`).
pub async fn handle_request(
    state: &AppState,
    ctx: &mut ConnectionCtx,
    envelope: ClientEnvelope,
) -> Option<ServerEvent> {
    let seq = envelope.seq;
    let request = envelope.request;

    let category = request.rate_category();
    if !state
        .limiter
        .check(&ctx.conn_id, category, category.limit(&state.config.limits))
    {
        debug!(
            conn_id = %ctx.conn_id,
            event = request.event_name(),
            "Rate limited, dropping"
        );
        return None;
    }

    let event_name = request.event_name();
    match dispatch(state, ctx, request).await {
        Ok(data) => seq.map(|s| ServerEvent::ack(s, data)),
        Err(e) => {
            warn!(
                conn_id = %ctx.conn_id,
                event = event_name,
                error = %e,
                "Request failed"
            );
            seq.map(|s| ServerEvent::ack_error(s, &e))
        }
    }
}

async fn dispatch(
    state: &AppState,
    ctx: &mut ConnectionCtx,
    request: ClientRequest,
) -> Result<Value> {
    let request = match request {
        ClientRequest::JoinMeeting { meeting_code } => {
            let join = ClientRequest::JoinMeeting {
                meeting_code: meeting_code.clone(),
            };
            join.validate()?;
            return join_meeting(state, ctx, &meeting_code).await;
        }
        other => other,
    };

    // Everything else requires a bound meeting and participant; host-only
    // events are authorized against the durable row before their payload is
    // even looked at
    let binding = ctx.binding.clone().ok_or(Error::NotBound)?;
    if request.requires_moderator() {
        require_moderator(state, &binding).await?;
    }
    request.validate()?;

    match request {
        ClientRequest::JoinMeeting { .. } => unreachable!("handled above"),

        // --- Media negotiation -------------------------------------------
        ClientRequest::CreateTransport { direction } => {
            let room = require_room(state, &binding)?;
            let params = room.create_transport(&ctx.conn_id, direction).await?;
            Ok(serde_json::to_value(params)?)
        }
        ClientRequest::ConnectTransport {
            transport_id,
            dtls_parameters,
        } => {
            let room = require_room(state, &binding)?;
            room.connect_transport(&ctx.conn_id, &transport_id, dtls_parameters)
                .await?;
            Ok(json!({ "connected": true }))
        }
        ClientRequest::Produce {
            transport_id,
            kind,
            rtp_parameters,
            app_data,
        } => {
            let room = require_room(state, &binding)?;
            let producer_id = room
                .create_producer(&ctx.conn_id, &transport_id, kind, rtp_parameters, app_data.kind)
                .await?;

            broadcast_scoped(
                state,
                &room,
                &ctx.conn_id,
                &ServerEvent::NewProducer {
                    participant_id: binding.participant_id.clone(),
                    producer_id,
                    kind,
                    app_type: app_data.kind,
                },
            );
            Ok(json!({ "producerId": producer_id }))
        }
        ClientRequest::Consume {
            producer_id,
            rtp_capabilities,
        } => {
            let room = require_room(state, &binding)?;
            let params = room
                .create_consumer(&ctx.conn_id, producer_id, rtp_capabilities)
                .await?;
            Ok(serde_json::to_value(params)?)
        }
        ClientRequest::ResumeConsumer { consumer_id } => {
            let room = require_room(state, &binding)?;
            let consumer = room.consumer(&ctx.conn_id, &consumer_id)?;
            consumer
                .resume()
                .await
                .map_err(|e| Error::Upstream(format!("Resume failed: {e}")))?;
            Ok(json!({ "resumed": true }))
        }
        ClientRequest::SetPreferredLayers {
            consumer_id,
            spatial_layer,
            temporal_layer,
        } => {
            let room = require_room(state, &binding)?;
            let consumer = room.consumer(&ctx.conn_id, &consumer_id)?;
            consumer
                .set_preferred_layers(ConsumerLayers {
                    spatial_layer,
                    temporal_layer: Some(temporal_layer),
                })
                .await
                .map_err(|e| Error::Upstream(format!("Set preferred layers failed: {e}")))?;
            Ok(json!({ "success": true }))
        }
        ClientRequest::PauseProducer { producer_id } => {
            let room = require_room(state, &binding)?;
            let producer = room.producer(&ctx.conn_id, &producer_id)?;
            producer
                .pause()
                .await
                .map_err(|e| Error::Upstream(format!("Pause failed: {e}")))?;
            room.set_producer_paused(&ctx.conn_id, &producer_id, true);

            broadcast_scoped(
                state,
                &room,
                &ctx.conn_id,
                &ServerEvent::ProducerPaused { producer_id },
            );
            Ok(json!({ "paused": true }))
        }
        ClientRequest::ResumeProducer { producer_id } => {
            let room = require_room(state, &binding)?;
            let producer = room.producer(&ctx.conn_id, &producer_id)?;
            producer
                .resume()
                .await
                .map_err(|e| Error::Upstream(format!("Resume failed: {e}")))?;
            room.set_producer_paused(&ctx.conn_id, &producer_id, false);

            broadcast_scoped(
                state,
                &room,
                &ctx.conn_id,
                &ServerEvent::ProducerResumed { producer_id },
            );
            Ok(json!({ "resumed": true }))
        }
        ClientRequest::CloseProducer { producer_id } => {
            let room = require_room(state, &binding)?;
            room.close_producer(&ctx.conn_id, &producer_id)?;

            broadcast_scoped(
                state,
                &room,
                &ctx.conn_id,
                &ServerEvent::ProducerClosed {
                    participant_id: binding.participant_id.clone(),
                    producer_id,
                },
            );
            Ok(json!({ "closed": true }))
        }

        // --- Host admission ----------------------------------------------
        ClientRequest::LobbyAdmit { participant_id } => {
            lobby_admit(state, &binding, &participant_id).await
        }
        ClientRequest::LobbyReject { participant_id } => {
            let target = state.admission.reject(&participant_id).await?;

            for conn_id in target_connections(state, &binding, &target) {
                state.hub.send_to(&conn_id, ServerEvent::LobbyRejected {});
                state.hub.unregister(&conn_id);
            }
            Ok(json!({ "rejected": true }))
        }
        ClientRequest::MoveToLobby { participant_id } => {
            let target = state.admission.move_to_lobby(&participant_id).await?;
            let room = require_room(state, &binding)?;

            for conn_id in target_connections(state, &binding, &target) {
                teardown_peer(state, &room, &conn_id, &target);
                state.hub.send_to(&conn_id, ServerEvent::MovedToLobby {});
                state
                    .hub
                    .join_group(&conn_id, &Group::Lobby(binding.meeting_code.clone()));
            }
            Ok(json!({ "moved": true }))
        }
        ClientRequest::KickParticipant { participant_id } => {
            let target = state.admission.kick(&participant_id).await?;

            if let Some(room) = state.rooms.get(&binding.meeting_code) {
                for conn_id in target_connections(state, &binding, &target) {
                    teardown_peer(state, &room, &conn_id, &target);
                    state.hub.send_to(&conn_id, ServerEvent::Kicked {});
                    state.hub.unregister(&conn_id);
                }
            }
            Ok(json!({ "kicked": true }))
        }
        ClientRequest::TransferHost { new_host_id } => {
            let caller = caller_participant(state, &binding).await?;
            let new_host = state.admission.transfer_host(&caller, &new_host_id).await?;

            state.hub.broadcast(
                &Group::Meeting(binding.meeting_code.clone()),
                &ServerEvent::HostChanged {
                    new_host_id: new_host.id,
                    old_host_id: caller.id,
                },
                None,
            );
            Ok(json!({ "transferred": true }))
        }
        ClientRequest::EndMeeting => {
            end_meeting(state, &binding).await
        }
        ClientRequest::InviteParticipant { email } => {
            let meeting = require_meeting(state, &binding).await?;

            state
                .invitations
                .create(&Invitation::new(
                    meeting.id.clone(),
                    email.clone(),
                    ctx.claims.user_id(),
                ))
                .await?;

            if let Err(e) = state
                .email
                .send_invitation(&email, &ctx.claims.name, &meeting.title, &meeting.code)
                .await
            {
                warn!(error = %e, "Invitation email failed; row persisted");
            }
            Ok(json!({ "invited": true }))
        }

        // --- Chat ---------------------------------------------------------
        ClientRequest::SendChat { content } => {
            let caller = caller_participant(state, &binding).await?;
            let message = state
                .chats
                .create(&ChatMessage::new(
                    binding.meeting_id.clone(),
                    caller.user_id,
                    content,
                ))
                .await?;

            let with_sender = parley_core::models::ChatMessageWithSender {
                message,
                sender_name: ctx.claims.name.clone(),
            };
            state.hub.broadcast(
                &Group::Meeting(binding.meeting_code.clone()),
                &ServerEvent::NewChat(with_sender),
                None,
            );
            Ok(json!({ "sent": true }))
        }
        ClientRequest::GetChatHistory => {
            let messages = state.chats.history(&binding.meeting_id, 100).await?;
            Ok(json!({ "messages": messages }))
        }

        // --- Q&A ----------------------------------------------------------
        ClientRequest::AskQuestion { content } => {
            let caller = caller_participant(state, &binding).await?;
            let question = state
                .questions
                .create(&Question::new(
                    binding.meeting_id.clone(),
                    caller.user_id,
                    content,
                ))
                .await?;

            let payload =
                crate::signaling::messages::QuestionPayload::from_question(&question, 0);
            state.hub.broadcast(
                &Group::Meeting(binding.meeting_code.clone()),
                &ServerEvent::NewQuestion(payload),
                None,
            );
            Ok(json!({ "questionId": question.id }))
        }
        ClientRequest::UpvoteQuestion { question_id } => {
            let caller = caller_participant(state, &binding).await?;
            let question = require_question(state, &binding, &question_id).await?;
            let result = state
                .questions
                .toggle_upvote(&question.id, &caller.user_id)
                .await?;

            state.hub.broadcast(
                &Group::Meeting(binding.meeting_code.clone()),
                &ServerEvent::QuestionUpvoted {
                    question_id: question.id,
                    upvote_count: result.upvote_count,
                },
                None,
            );
            Ok(json!({
                "upvoteCount": result.upvote_count,
                "hasUpvoted": result.has_upvoted,
            }))
        }
        ClientRequest::MarkAnswered { question_id } => {
            let question = require_question(state, &binding, &question_id).await?;
            let is_answered = state.questions.toggle_answered(&question.id).await?;

            state.hub.broadcast(
                &Group::Meeting(binding.meeting_code.clone()),
                &ServerEvent::QuestionAnswered {
                    question_id: question.id,
                    is_answered,
                },
                None,
            );
            Ok(json!({ "isAnswered": is_answered }))
        }
        ClientRequest::PinQuestion { question_id } => {
            let question = require_question(state, &binding, &question_id).await?;
            let is_pinned = state.questions.toggle_pinned(&question.id).await?;

            state.hub.broadcast(
                &Group::Meeting(binding.meeting_code.clone()),
                &ServerEvent::QuestionPinned {
                    question_id: question.id,
                    is_pinned,
                },
                None,
            );
            Ok(json!({ "isPinned": is_pinned }))
        }

        // --- Breakouts ----------------------------------------------------
        ClientRequest::CreateBreakout { rooms, duration } => {
            let meeting = require_meeting(state, &binding).await?;
            let room = require_room(state, &binding)?;

            let summaries =
                breakout::create_breakouts(state, &meeting, &room, &rooms, duration).await?;

            state.hub.broadcast(
                &Group::Meeting(binding.meeting_code.clone()),
                &ServerEvent::BreakoutCreated { rooms: summaries },
                None,
            );
            Ok(json!({ "created": true }))
        }
        ClientRequest::CloseBreakouts => {
            let meeting = require_meeting(state, &binding).await?;
            let room = require_room(state, &binding)?;

            breakout::close_breakouts(state, &meeting, &room).await?;
            Ok(json!({ "closed": true }))
        }
        ClientRequest::BroadcastToBreakouts { message } => {
            let meeting = require_meeting(state, &binding).await?;

            let sent =
                breakout::broadcast_to_breakouts(state, &meeting, &ctx.claims.name, &message)
                    .await?;
            Ok(json!({ "sent": sent }))
        }
    }
}

// --- join / admission flows ----------------------------------------------

async fn join_meeting(
    state: &AppState,
    ctx: &mut ConnectionCtx,
    meeting_code: &str,
) -> Result<Value> {
    if ctx.binding.is_some() {
        return Err(Error::InvalidState(
            "Connection is already bound to a meeting".to_string(),
        ));
    }

    let outcome = state.admission.join(meeting_code, &ctx.claims).await?;

    match outcome {
        JoinOutcome::Lobby {
            meeting,
            participant,
        } => {
            bind(state, ctx, &meeting, &participant);
            state
                .hub
                .join_group(&ctx.conn_id, &Group::Lobby(meeting.code.clone()));

            state.hub.send_to(
                &ctx.conn_id,
                ServerEvent::LobbyWaiting {
                    meeting_title: meeting.title.clone(),
                },
            );

            // Hosts inside the meeting see who is waiting
            state.hub.broadcast(
                &Group::Meeting(meeting.code.clone()),
                &ServerEvent::LobbyParticipant(summary_from_claims(&participant, &ctx.claims)),
                None,
            );

            Ok(json!({ "status": "lobby" }))
        }
        JoinOutcome::Admitted {
            meeting,
            participant,
        } => {
            bind(state, ctx, &meeting, &participant);
            let room = state.rooms.get_or_create(&meeting.id, &meeting.code).await?;

            room.add_peer(PeerIdentity {
                conn_id: ctx.conn_id.clone(),
                user_id: participant.user_id.clone(),
                participant_id: participant.id.clone(),
                name: ctx.claims.name.clone(),
            })?;

            // Announce to the room before the newcomer enters the group so
            // they do not receive their own join event
            state.hub.broadcast(
                &Group::Meeting(meeting.code.clone()),
                &ServerEvent::ParticipantJoined(summary_from_claims(&participant, &ctx.claims)),
                None,
            );
            state
                .hub
                .join_group(&ctx.conn_id, &Group::Meeting(meeting.code.clone()));

            send_meeting_joined(state, &room, &ctx.conn_id, &meeting).await?;

            Ok(json!({ "status": "joined" }))
        }
    }
}

async fn lobby_admit(
    state: &AppState,
    binding: &Binding,
    participant_id: &ParticipantId,
) -> Result<Value> {
    let target = state.admission.admit(participant_id).await?;
    let meeting = require_meeting(state, binding).await?;
    let room = state.rooms.get_or_create(&meeting.id, &meeting.code).await?;

    let user = state
        .admission
        .users()
        .get_by_id(&target.user_id)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))?;

    let summary = ParticipantSummary {
        participant_id: target.id.clone(),
        user_id: target.user_id.clone(),
        name: user.name.clone(),
        avatar_url: user.avatar_url.clone(),
        role: target.role,
        status: target.status,
    };

    // The room hears about the newcomer before the newcomer's group move
    state.hub.broadcast(
        &Group::Meeting(meeting.code.clone()),
        &ServerEvent::ParticipantJoined(summary),
        None,
    );

    for conn_id in target_connections(state, binding, &target) {
        if let Err(e) = room.add_peer(PeerIdentity {
            conn_id: conn_id.clone(),
            user_id: target.user_id.clone(),
            participant_id: target.id.clone(),
            name: user.name.clone(),
        }) {
            warn!(conn_id = %conn_id, error = %e, "Could not seat admitted peer");
            continue;
        }
        state
            .hub
            .join_group(&conn_id, &Group::Meeting(meeting.code.clone()));

        send_meeting_joined(state, &room, &conn_id, &meeting).await?;
        state.hub.send_to(
            &conn_id,
            ServerEvent::Admitted {
                participant_id: target.id.clone(),
            },
        );
    }

    Ok(json!({ "admitted": true }))
}

async fn end_meeting(state: &AppState, binding: &Binding) -> Result<Value> {
    let meeting = require_meeting(state, binding).await?;

    state.admission.end_meeting(&meeting).await?;
    breakout::cancel_auto_close(state, &meeting);

    // Every scope of the meeting hears the end before the disconnects
    let mut groups = vec![
        Group::Meeting(meeting.code.clone()),
        Group::Lobby(meeting.code.clone()),
    ];
    for breakout_room in state.breakout_rooms.list_active(&meeting.id).await? {
        groups.push(Group::Breakout(breakout_room.id));
    }
    state.breakout_rooms.deactivate_all(&meeting.id).await?;

    if let Some(room) = state.rooms.remove(&meeting.code) {
        room.close();
    }

    let mut members = Vec::new();
    for group in &groups {
        state.hub.broadcast(group, &ServerEvent::MeetingEnded {}, None);
        members.extend(state.hub.members(group));
    }
    for conn_id in members {
        state.hub.unregister(&conn_id);
    }

    Ok(json!({ "ended": true }))
}

/// Disconnect cleanup. Durable errors are swallowed (best-effort); the
/// in-memory room state is cleaned regardless.
pub async fn handle_disconnect(state: &AppState, ctx: &ConnectionCtx) {
    state.limiter.release(&ctx.conn_id);

    if let Some(binding) = &ctx.binding {
        if let Some(room) = state.rooms.get(&binding.meeting_code) {
            let scope = room.scope_of(&ctx.conn_id);
            if let Some(removed) = room.remove_peer(&ctx.conn_id) {
                let group = scope.map_or_else(
                    || Group::Meeting(binding.meeting_code.clone()),
                    |s| breakout::scope_group(&room, &s),
                );
                for (producer_id, _) in removed.closed_producers {
                    state.hub.broadcast(
                        &group,
                        &ServerEvent::ProducerClosed {
                            participant_id: removed.identity.participant_id.clone(),
                            producer_id,
                        },
                        Some(&ctx.conn_id),
                    );
                }
                state.hub.broadcast(
                    &group,
                    &ServerEvent::ParticipantLeft {
                        participant_id: removed.identity.participant_id.clone(),
                        user_id: removed.identity.user_id.clone(),
                    },
                    Some(&ctx.conn_id),
                );
            }
            state.rooms.remove_if_empty(&binding.meeting_code);
        }

        if let Err(e) = state.admission.mark_disconnected(&binding.participant_id).await {
            debug!(
                participant_id = %binding.participant_id,
                error = %e,
                "Disconnect stamp failed (best-effort)"
            );
        }
    }

    state.hub.unregister(&ctx.conn_id);
}

// --- shared helpers -------------------------------------------------------

fn bind(state: &AppState, ctx: &mut ConnectionCtx, meeting: &Meeting, participant: &Participant) {
    state
        .hub
        .bind_meeting(&ctx.conn_id, meeting.id.clone());
    ctx.binding = Some(Binding {
        meeting_id: meeting.id.clone(),
        meeting_code: meeting.code.clone(),
        participant_id: participant.id.clone(),
    });
}

fn require_room(state: &AppState, binding: &Binding) -> Result<Arc<MediaRoom>> {
    state
        .rooms
        .get(&binding.meeting_code)
        .ok_or_else(|| Error::NotFound("Meeting room not found".to_string()))
}

async fn require_meeting(state: &AppState, binding: &Binding) -> Result<Meeting> {
    state
        .admission
        .meetings()
        .get_by_id(&binding.meeting_id)
        .await?
        .ok_or_else(|| Error::NotFound("Meeting not found".to_string()))
}

/// The caller's durable row; a removed participant has no standing.
async fn caller_participant(state: &AppState, binding: &Binding) -> Result<Participant> {
    let participant = state
        .admission
        .participants()
        .get_by_id(&binding.participant_id)
        .await?
        .ok_or_else(|| Error::NotFound("Participant not found".to_string()))?;
    if participant.status == ParticipantStatus::Removed {
        return Err(Error::PermissionDenied(
            "You were removed from this meeting".to_string(),
        ));
    }
    Ok(participant)
}

/// Host-only gate: HOST or CO_HOST passes.
async fn require_moderator(state: &AppState, binding: &Binding) -> Result<Participant> {
    let participant = caller_participant(state, binding).await?;
    if !participant.role.can_moderate() {
        return Err(Error::PermissionDenied(
            "This action requires the host role".to_string(),
        ));
    }
    Ok(participant)
}

async fn require_question(
    state: &AppState,
    binding: &Binding,
    question_id: &QuestionId,
) -> Result<Question> {
    let question = state
        .questions
        .get_by_id(question_id)
        .await?
        .ok_or_else(|| Error::NotFound("Question not found".to_string()))?;
    if question.meeting_id != binding.meeting_id {
        return Err(Error::NotFound("Question not found".to_string()));
    }
    Ok(question)
}

/// Fan out a media event to the originator's scope, excluding the
/// originator itself. Peers in a breakout never hear main-scope events and
/// vice versa.
fn broadcast_scoped(
    state: &AppState,
    room: &Arc<MediaRoom>,
    conn_id: &ConnId,
    event: &ServerEvent,
) {
    if let Some(scope) = room.scope_of(conn_id) {
        let group = breakout::scope_group(room, &scope);
        state.hub.broadcast(&group, event, Some(conn_id));
    }
}

fn target_connections(state: &AppState, binding: &Binding, target: &Participant) -> Vec<ConnId> {
    state
        .hub
        .connections_of_user(&binding.meeting_id, &target.user_id)
}

/// Remove a peer from the room and fan out its closures to its old scope.
fn teardown_peer(
    state: &AppState,
    room: &Arc<MediaRoom>,
    conn_id: &ConnId,
    target: &Participant,
) {
    let scope = room.scope_of(conn_id);
    if let Some(removed) = room.remove_peer(conn_id) {
        let group = scope.map_or_else(
            || Group::Meeting(room.meeting_code().to_string()),
            |s: Scope| breakout::scope_group(room, &s),
        );
        for (producer_id, _) in removed.closed_producers {
            state.hub.broadcast(
                &group,
                &ServerEvent::ProducerClosed {
                    participant_id: target.id.clone(),
                    producer_id,
                },
                Some(conn_id),
            );
        }
        state.hub.broadcast(
            &group,
            &ServerEvent::ParticipantLeft {
                participant_id: target.id.clone(),
                user_id: target.user_id.clone(),
            },
            Some(conn_id),
        );
    }
}

/// Push `meeting-joined` with roster, router capabilities and the producers
/// already live in the peer's scope.
async fn send_meeting_joined(
    state: &AppState,
    room: &Arc<MediaRoom>,
    conn_id: &ConnId,
    meeting: &Meeting,
) -> Result<()> {
    let roster: Vec<ParticipantSummary> = state
        .admission
        .participants()
        .list_with_users(&meeting.id, None)
        .await?
        .iter()
        .filter(|p: &&ParticipantWithUser| {
            matches!(
                p.participant.status,
                ParticipantStatus::InMeeting | ParticipantStatus::InBreakout
            )
        })
        .map(ParticipantSummary::from)
        .collect();

    let router_capabilities = room.router_capabilities_for(conn_id)?;
    let existing_producers = room.existing_producers_for(conn_id);

    state.hub.send_to(
        conn_id,
        ServerEvent::MeetingJoined {
            meeting: MeetingSummary::from(meeting),
            participants: roster,
            router_capabilities,
            existing_producers,
        },
    );
    Ok(())
}

fn summary_from_claims(participant: &Participant, claims: &Claims) -> ParticipantSummary {
    ParticipantSummary {
        participant_id: participant.id.clone(),
        user_id: participant.user_id.clone(),
        name: claims.name.clone(),
        avatar_url: claims.picture.clone(),
        role: participant.role,
        status: participant.status,
    }
}
