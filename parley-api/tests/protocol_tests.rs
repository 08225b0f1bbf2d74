//! Protocol-level behavior that needs no database or media engine: wire
//! shapes, broadcast-group transitions, and rate-limit drop semantics.

use parley_api::hub::{BroadcastHub, Group};
use parley_api::signaling::{ClientEnvelope, ClientRequest, ServerEvent};
use parley_core::config::LimitsConfig;
use parley_core::models::{ConnId, UserId};
use parley_core::service::{RateCategory, RateLimiter};

fn parse(frame: &str) -> ClientEnvelope {
    serde_json::from_str(frame).unwrap_or_else(|e| panic!("bad frame {frame}: {e}"))
}

#[test]
fn media_requests_parse_with_engine_payloads() {
    let envelope = parse(
        r#"{"event":"create-transport","seq":2,"payload":{"direction":"send"}}"#,
    );
    assert_eq!(envelope.request.event_name(), "create-transport");

    let envelope = parse(
        r#"{"event":"set-preferred-layers","seq":3,"payload":{
            "consumerId":"6351a924-4b71-40a8-87b0-6d9a2b3b77ee",
            "spatialLayer":1,
            "temporalLayer":2}}"#,
    );
    let ClientRequest::SetPreferredLayers {
        spatial_layer,
        temporal_layer,
        ..
    } = envelope.request
    else {
        panic!("wrong variant");
    };
    assert_eq!((spatial_layer, temporal_layer), (1, 2));
}

#[test]
fn admission_requests_parse() {
    for frame in [
        r#"{"event":"lobby-admit","seq":1,"payload":{"participantId":"p23456789012"}}"#,
        r#"{"event":"kick-participant","payload":{"participantId":"p23456789012"}}"#,
        r#"{"event":"transfer-host","payload":{"newHostId":"p23456789012"}}"#,
        r#"{"event":"end-meeting"}"#,
        r#"{"event":"invite-participant","payload":{"email":"bob@example.com"}}"#,
    ] {
        let envelope = parse(frame);
        assert_eq!(envelope.request.rate_category(), RateCategory::Admin);
    }
}

#[test]
fn breakout_round_trip_restores_meeting_membership() {
    // create-breakout followed by close-breakouts restores the set of
    // meeting-group members to the pre-breakout set
    let hub = BroadcastHub::new();
    let meeting = Group::Meeting("abc-defg-hij".to_string());
    let breakout = Group::Breakout(parley_core::models::BreakoutRoomId::new());

    let conns: Vec<ConnId> = (0..3)
        .map(|i| {
            let conn = ConnId::new();
            hub.register(conn.clone(), UserId::new(), format!("user{i}@example.com"));
            hub.join_group(&conn, &meeting);
            conn
        })
        .collect();

    let mut before: Vec<String> = hub.members(&meeting).iter().map(|c| c.0.clone()).collect();
    before.sort();

    // B and C move to the breakout; A stays behind
    hub.join_group(&conns[1], &breakout);
    hub.join_group(&conns[2], &breakout);
    assert_eq!(hub.members(&meeting).len(), 1);
    assert_eq!(hub.members(&breakout).len(), 2);

    // Merge back
    hub.join_group(&conns[1], &meeting);
    hub.join_group(&conns[2], &meeting);

    let mut after: Vec<String> = hub.members(&meeting).iter().map(|c| c.0.clone()).collect();
    after.sort();
    assert_eq!(before, after);
    assert!(hub.members(&breakout).is_empty());
}

#[test]
fn breakout_members_do_not_hear_meeting_broadcasts() {
    let hub = BroadcastHub::new();
    let meeting = Group::Meeting("abc-defg-hij".to_string());
    let breakout = Group::Breakout(parley_core::models::BreakoutRoomId::new());

    let a = ConnId::new();
    let b = ConnId::new();
    let _rx_a = hub.register(a.clone(), UserId::new(), "a@example.com".to_string());
    let mut rx_b = hub.register(b.clone(), UserId::new(), "b@example.com".to_string());
    hub.join_group(&a, &meeting);
    hub.join_group(&b, &breakout);

    let sent = hub.broadcast(&meeting, &ServerEvent::MeetingEnded {}, None);
    assert_eq!(sent, 1);
    assert!(rx_b.try_recv().is_err());
}

#[test]
fn burst_over_media_limit_is_dropped_not_fatal() {
    // 40 produce-class events in a tight burst: at most 30 pass, the rest
    // are dropped, and the connection's counters survive for the next check
    let limits = LimitsConfig::default();
    let limiter = RateLimiter::new();
    let conn = ConnId::new();

    let mut allowed = 0;
    for _ in 0..40 {
        let category = RateCategory::Media;
        if limiter.check(&conn, category, category.limit(&limits)) {
            allowed += 1;
        }
    }
    assert_eq!(allowed, 30);

    // A different category on the same connection is unaffected
    let chat = RateCategory::Chat;
    assert!(limiter.check(&conn, chat, chat.limit(&limits)));
}

#[test]
fn ack_error_carries_message_only() {
    let err = parley_core::Error::PermissionDenied("This action requires the host role".into());
    let ack = ServerEvent::ack_error(12, &err);
    let json = serde_json::to_value(&ack).unwrap();

    assert_eq!(json["event"], "ack");
    assert_eq!(json["payload"]["seq"], 12);
    assert_eq!(
        json["payload"]["error"],
        "This action requires the host role"
    );
}
