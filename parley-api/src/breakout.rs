//! Breakout coordinator.
//!
//! Creates sub-rooms with their own routers, moves participants across
//! scopes, arms the auto-close timer, and merges everyone back. All durable
//! writes go through the repositories first; in-memory moves and client
//! renegotiation instructions follow.

use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

use parley_core::models::{BreakoutRoom, Meeting, ParticipantStatus};
use parley_core::{Error, Result};

use crate::hub::Group;
use crate::rtc::{MediaRoom, Scope};
use crate::signaling::messages::{BreakoutConfig, BreakoutSummary, ServerEvent};
use crate::state::AppState;

/// Create breakout rooms and move the listed participants into them.
/// Returns the created room summaries for the `breakout-created` fan-out.
pub async fn create_breakouts(
    state: &AppState,
    meeting: &Meeting,
    room: &Arc<MediaRoom>,
    configs: &[BreakoutConfig],
    duration_minutes: Option<u64>,
) -> Result<Vec<BreakoutSummary>> {
    let ends_at = duration_minutes
        .map(|minutes| Utc::now() + ChronoDuration::minutes(minutes as i64));

    let mut summaries = Vec::with_capacity(configs.len());

    for config in configs {
        // Durable row first, then the router, then the peer moves
        let record = state
            .breakout_rooms
            .create(&BreakoutRoom::new(
                meeting.id.clone(),
                config.name.clone(),
                ends_at,
            ))
            .await?;

        let capabilities = room.create_breakout_router(record.id.clone()).await?;

        let summary = BreakoutSummary {
            id: record.id.clone(),
            name: record.name.clone(),
            ends_at: record.ends_at,
        };

        for participant_id in &config.participant_ids {
            let Some(participant) = state
                .admission
                .participants()
                .get_by_id(participant_id)
                .await?
            else {
                warn!(participant_id = %participant_id, "Breakout assignee not found, skipping");
                continue;
            };
            if participant.meeting_id != meeting.id
                || participant.status == ParticipantStatus::Removed
            {
                continue;
            }

            state
                .admission
                .participants()
                .set_breakout(participant_id, &record.id)
                .await?;

            // Move any live connection of theirs out of the main scope
            for conn_id in state
                .hub
                .connections_of_user(&meeting.id, &participant.user_id)
            {
                match room.move_peer_to_breakout(&conn_id, &record.id) {
                    Ok((reseated, _)) => {
                        // Old main-scope producers are gone; tell the main room
                        for (producer_id, _) in reseated.closed_producers {
                            state.hub.broadcast(
                                &Group::Meeting(meeting.code.clone()),
                                &ServerEvent::ProducerClosed {
                                    participant_id: reseated.identity.participant_id.clone(),
                                    producer_id,
                                },
                                Some(&conn_id),
                            );
                        }
                        state
                            .hub
                            .join_group(&conn_id, &Group::Breakout(record.id.clone()));
                        state.hub.send_to(
                            &conn_id,
                            ServerEvent::BreakoutJoined {
                                breakout_room: summary.clone(),
                                router_capabilities: capabilities.clone(),
                            },
                        );
                    }
                    Err(e) => {
                        warn!(
                            conn_id = %conn_id,
                            error = %e,
                            "Could not reseat connection into breakout"
                        );
                    }
                }
            }
        }

        summaries.push(summary);
    }

    if let Some(minutes) = duration_minutes {
        arm_auto_close(state, meeting, minutes);
    }

    info!(
        meeting_code = %meeting.code,
        rooms = summaries.len(),
        "Breakout rooms created"
    );
    Ok(summaries)
}

/// One-shot timer that closes the breakout set when the duration elapses.
/// Manual close cancels it; the timer clears its own registration before
/// running so the two paths cannot double-close.
fn arm_auto_close(state: &AppState, meeting: &Meeting, minutes: u64) {
    let state_clone = state.clone();
    let meeting_clone = meeting.clone();
    let meeting_id = meeting.id.clone();

    let handle = tokio::spawn(async move {
        sleep(Duration::from_secs(minutes * 60)).await;

        // Deregister first: if a manual close won the race there is nothing
        // left to do.
        if state_clone
            .breakout_timers
            .remove(&meeting_clone.id)
            .is_none()
        {
            return;
        }

        info!(meeting_code = %meeting_clone.code, "Breakout duration elapsed, closing");
        if let Some(room) = state_clone.rooms.get(&meeting_clone.code) {
            if let Err(e) = close_breakouts(&state_clone, &meeting_clone, &room).await {
                error!(error = %e, "Timed breakout close failed");
            }
        }
    });

    // Replacing a previous timer aborts it
    if let Some(previous) = state.breakout_timers.insert(meeting_id, handle) {
        previous.abort();
    }
}

/// Cancel the armed auto-close timer, if any.
pub fn cancel_auto_close(state: &AppState, meeting: &Meeting) {
    if let Some((_, handle)) = state.breakout_timers.remove(&meeting.id) {
        handle.abort();
    }
}

/// Close every breakout of the meeting: durable rows first, then statuses,
/// then the in-memory merge and renegotiation instructions.
pub async fn close_breakouts(
    state: &AppState,
    meeting: &Meeting,
    room: &Arc<MediaRoom>,
) -> Result<()> {
    cancel_auto_close(state, meeting);

    let closed = state.breakout_rooms.deactivate_all(&meeting.id).await?;
    if closed == 0 {
        return Err(Error::InvalidState(
            "No active breakout rooms".to_string(),
        ));
    }
    state
        .admission
        .participants()
        .clear_breakouts(&meeting.id)
        .await?;

    let main_capabilities = room.main_router_capabilities();
    let reseated = room.close_all_breakouts();

    for peer in &reseated {
        state
            .hub
            .join_group(&peer.identity.conn_id, &Group::Meeting(meeting.code.clone()));
        state.hub.send_to(
            &peer.identity.conn_id,
            ServerEvent::BreakoutEnded {
                router_capabilities: main_capabilities.clone(),
            },
        );
    }

    state.hub.broadcast(
        &Group::Meeting(meeting.code.clone()),
        &ServerEvent::BreakoutClosed {},
        None,
    );

    info!(
        meeting_code = %meeting.code,
        reseated = reseated.len(),
        "Breakout rooms closed"
    );
    Ok(())
}

/// Host message fanned out to every breakout of the meeting.
pub async fn broadcast_to_breakouts(
    state: &AppState,
    meeting: &Meeting,
    from: &str,
    message: &str,
) -> Result<usize> {
    let rooms = state.breakout_rooms.list_active(&meeting.id).await?;
    if rooms.is_empty() {
        return Err(Error::InvalidState(
            "No active breakout rooms".to_string(),
        ));
    }

    let event = ServerEvent::BreakoutBroadcast {
        message: message.to_string(),
        from: from.to_string(),
    };

    let mut sent = 0;
    for room in rooms {
        sent += state.hub.broadcast(&Group::Breakout(room.id), &event, None);
    }
    Ok(sent)
}

/// Scope-aware broadcast group for a connection inside a room.
pub fn scope_group(room: &MediaRoom, conn_scope: &Scope) -> Group {
    match conn_scope {
        Scope::Main => Group::Meeting(room.meeting_code().to_string()),
        Scope::Breakout(id) => Group::Breakout(id.clone()),
    }
}
