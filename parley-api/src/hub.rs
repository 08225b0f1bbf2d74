//! Broadcast hub.
//!
//! Routes server pushes to connected clients. Every connection belongs to at
//! most one group at a time (`lobby:<code>`, `meeting:<code>` or
//! `breakout:<id>`), and moving between groups is atomic relative to
//! outbound sends: membership changes take the write lock that broadcasts
//! read under.

use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use parley_core::models::{BreakoutRoomId, ConnId, MeetingId, UserId};
use parley_core::service::{ReminderEvent, ReminderSink};

use crate::signaling::messages::ServerEvent;

/// Broadcast scope a connection can belong to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Group {
    Lobby(String),
    Meeting(String),
    Breakout(BreakoutRoomId),
}

impl Group {
    fn key(&self) -> String {
        match self {
            Self::Lobby(code) => format!("lobby:{code}"),
            Self::Meeting(code) => format!("meeting:{code}"),
            Self::Breakout(id) => format!("breakout:{id}"),
        }
    }
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

struct Subscriber {
    user_id: UserId,
    email: String,
    /// Meeting the connection is bound to after join, for presence queries
    meeting_id: Option<MeetingId>,
    group: Option<String>,
    sender: mpsc::UnboundedSender<ServerEvent>,
}

#[derive(Default)]
struct HubInner {
    connections: HashMap<ConnId, Subscriber>,
    groups: HashMap<String, HashSet<ConnId>>,
}

#[derive(Default)]
pub struct BroadcastHub {
    inner: RwLock<HubInner>,
}

impl BroadcastHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly accepted connection. It belongs to no group until
    /// `join_group`.
    pub fn register(
        &self,
        conn_id: ConnId,
        user_id: UserId,
        email: String,
    ) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.write();
        inner.connections.insert(
            conn_id,
            Subscriber {
                user_id,
                email,
                meeting_id: None,
                group: None,
                sender: tx,
            },
        );
        rx
    }

    /// Remove a connection and its group membership.
    pub fn unregister(&self, conn_id: &ConnId) {
        let mut inner = self.inner.write();
        if let Some(sub) = inner.connections.remove(conn_id) {
            if let Some(group) = sub.group {
                remove_from_group(&mut inner, &group, conn_id);
            }
        }
    }

    /// Record which meeting a connection is bound to (set at join).
    pub fn bind_meeting(&self, conn_id: &ConnId, meeting_id: MeetingId) {
        let mut inner = self.inner.write();
        if let Some(sub) = inner.connections.get_mut(conn_id) {
            sub.meeting_id = Some(meeting_id);
        }
    }

    /// Move a connection into `group`, leaving its previous group in the
    /// same critical section.
    pub fn join_group(&self, conn_id: &ConnId, group: &Group) {
        let key = group.key();
        let mut inner = self.inner.write();

        let Some(sub) = inner.connections.get_mut(conn_id) else {
            warn!(conn_id = %conn_id, "join_group on unknown connection");
            return;
        };
        let previous = sub.group.replace(key.clone());

        if let Some(previous) = previous {
            remove_from_group(&mut inner, &previous, conn_id);
        }
        inner
            .groups
            .entry(key)
            .or_default()
            .insert(conn_id.clone());
    }

    /// Leave the current group without joining another (disconnect mid-flow
    /// or removal from the meeting).
    pub fn leave_group(&self, conn_id: &ConnId) {
        let mut inner = self.inner.write();
        let Some(sub) = inner.connections.get_mut(conn_id) else {
            return;
        };
        if let Some(group) = sub.group.take() {
            remove_from_group(&mut inner, &group, conn_id);
        }
    }

    /// Fan out to a group, optionally excluding one connection (usually the
    /// originator). Dead receivers are dropped silently; their connection
    /// tasks clean up on their own.
    pub fn broadcast(&self, group: &Group, event: &ServerEvent, except: Option<&ConnId>) -> usize {
        let inner = self.inner.read();
        let Some(members) = inner.groups.get(&group.key()) else {
            return 0;
        };

        let mut sent = 0;
        for conn_id in members {
            if Some(conn_id) == except {
                continue;
            }
            if let Some(sub) = inner.connections.get(conn_id) {
                if sub.sender.send(event.clone()).is_ok() {
                    sent += 1;
                }
            }
        }

        debug!(group = %group, sent, "Broadcast");
        sent
    }

    /// Send to a single connection.
    pub fn send_to(&self, conn_id: &ConnId, event: ServerEvent) -> bool {
        let inner = self.inner.read();
        inner
            .connections
            .get(conn_id)
            .is_some_and(|sub| sub.sender.send(event).is_ok())
    }

    /// Group members snapshot.
    pub fn members(&self, group: &Group) -> Vec<ConnId> {
        let inner = self.inner.read();
        inner
            .groups
            .get(&group.key())
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// The group a connection currently belongs to, if any.
    pub fn group_of(&self, conn_id: &ConnId) -> Option<String> {
        self.inner.read().connections.get(conn_id)?.group.clone()
    }

    pub fn connection_count(&self) -> usize {
        self.inner.read().connections.len()
    }

    /// Connections of a user inside one meeting (kick/admit targeting).
    pub fn connections_of_user(&self, meeting_id: &MeetingId, user_id: &UserId) -> Vec<ConnId> {
        let inner = self.inner.read();
        inner
            .connections
            .iter()
            .filter(|(_, sub)| {
                sub.meeting_id.as_ref() == Some(meeting_id) && &sub.user_id == user_id
            })
            .map(|(id, _)| id.clone())
            .collect()
    }
}

fn remove_from_group(inner: &mut HubInner, key: &str, conn_id: &ConnId) {
    if let Some(members) = inner.groups.get_mut(key) {
        members.remove(conn_id);
        if members.is_empty() {
            inner.groups.remove(key);
        }
    }
}

impl ReminderSink for BroadcastHub {
    fn push_reminder(&self, email: &str, event: &ReminderEvent) {
        let inner = self.inner.read();
        for sub in inner.connections.values().filter(|s| s.email == email) {
            let _ = sub.sender.send(ServerEvent::Reminder(event.clone()));
        }
    }

    fn connected_meetings(&self) -> Vec<MeetingId> {
        let inner = self.inner.read();
        let mut ids: Vec<MeetingId> = inner
            .connections
            .values()
            .filter_map(|s| s.meeting_id.clone())
            .collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids.dedup();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(hub: &BroadcastHub) -> (ConnId, mpsc::UnboundedReceiver<ServerEvent>) {
        let conn_id = ConnId::new();
        let rx = hub.register(conn_id.clone(), UserId::new(), "a@example.com".to_string());
        (conn_id, rx)
    }

    #[tokio::test]
    async fn test_broadcast_reaches_group_members() {
        let hub = BroadcastHub::new();
        let group = Group::Meeting("abc-defg-hij".to_string());

        let (a, mut rx_a) = register(&hub);
        let (b, mut rx_b) = register(&hub);
        hub.join_group(&a, &group);
        hub.join_group(&b, &group);

        let sent = hub.broadcast(&group, &ServerEvent::MeetingEnded {}, None);
        assert_eq!(sent, 2);
        assert!(matches!(rx_a.recv().await, Some(ServerEvent::MeetingEnded {})));
        assert!(matches!(rx_b.recv().await, Some(ServerEvent::MeetingEnded {})));
    }

    #[tokio::test]
    async fn test_broadcast_excludes_originator() {
        let hub = BroadcastHub::new();
        let group = Group::Meeting("abc-defg-hij".to_string());

        let (a, mut rx_a) = register(&hub);
        let (b, _rx_b) = register(&hub);
        hub.join_group(&a, &group);
        hub.join_group(&b, &group);

        let sent = hub.broadcast(&group, &ServerEvent::MeetingEnded {}, Some(&b));
        assert_eq!(sent, 1);
        assert!(rx_a.recv().await.is_some());
    }

    #[test]
    fn test_one_group_per_connection() {
        let hub = BroadcastHub::new();
        let lobby = Group::Lobby("abc-defg-hij".to_string());
        let meeting = Group::Meeting("abc-defg-hij".to_string());

        let (a, _rx) = register(&hub);
        hub.join_group(&a, &lobby);
        assert_eq!(hub.group_of(&a).unwrap(), "lobby:abc-defg-hij");

        // Admission moves lobby -> meeting; the lobby membership must be gone
        hub.join_group(&a, &meeting);
        assert_eq!(hub.group_of(&a).unwrap(), "meeting:abc-defg-hij");
        assert!(hub.members(&lobby).is_empty());
        assert_eq!(hub.members(&meeting).len(), 1);
    }

    #[test]
    fn test_unregister_cleans_group() {
        let hub = BroadcastHub::new();
        let group = Group::Meeting("abc-defg-hij".to_string());

        let (a, _rx) = register(&hub);
        hub.join_group(&a, &group);
        hub.unregister(&a);

        assert!(hub.members(&group).is_empty());
        assert_eq!(hub.connection_count(), 0);
        assert_eq!(hub.broadcast(&group, &ServerEvent::MeetingEnded {}, None), 0);
    }

    #[tokio::test]
    async fn test_reminder_targets_email() {
        let hub = BroadcastHub::new();
        let a = ConnId::new();
        let b = ConnId::new();
        let mut rx_a = hub.register(a.clone(), UserId::new(), "bob@example.com".to_string());
        let mut rx_b = hub.register(b.clone(), UserId::new(), "carol@example.com".to_string());

        let event = ReminderEvent {
            kind: "in_app".to_string(),
            meeting_id: MeetingId::new(),
            meeting_title: "Standup".to_string(),
            meeting_code: "abc-defg-hij".to_string(),
            minutes_before: 15,
            target_email: "bob@example.com".to_string(),
        };
        hub.push_reminder("bob@example.com", &event);

        assert!(matches!(rx_a.recv().await, Some(ServerEvent::Reminder(_))));
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn test_connected_meetings_dedups() {
        let hub = BroadcastHub::new();
        let meeting = MeetingId::new();
        let (a, _ra) = register(&hub);
        let (b, _rb) = register(&hub);
        hub.bind_meeting(&a, meeting.clone());
        hub.bind_meeting(&b, meeting.clone());

        assert_eq!(hub.connected_meetings(), vec![meeting]);
    }
}
