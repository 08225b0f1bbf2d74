//! Per-connection media state within one room scope.
//!
//! A peer owns at most one transport per direction and the producers and
//! consumers created on them. Engine entities close when their last handle
//! drops, so clearing the registries here is the close cascade. A peer that
//! moves between the main scope and a breakout is closed and rebuilt from
//! its identity on the destination router.

use mediasoup::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use parley_core::models::{ConnId, ParticipantId, UserId};
use parley_core::{Error, Result};

/// Application-level track type. `Screen` is single-writer per scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaAppType {
    Audio,
    Video,
    Screen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportDirection {
    Send,
    Recv,
}

/// Identity snapshot a peer is rebuilt from when it changes scope.
#[derive(Debug, Clone)]
pub struct PeerIdentity {
    pub conn_id: ConnId,
    pub user_id: UserId,
    pub participant_id: ParticipantId,
    pub name: String,
}

/// A producer plus the wire-level metadata the engine does not track.
pub struct ProducerHandle {
    pub producer: Producer,
    pub app_type: MediaAppType,
    pub paused: bool,
}

pub struct Peer {
    identity: PeerIdentity,
    send_transport: Option<WebRtcTransport>,
    recv_transport: Option<WebRtcTransport>,
    producers: HashMap<ProducerId, ProducerHandle>,
    consumers: HashMap<ConsumerId, Consumer>,
    /// Transports whose DTLS handshake completed; makes connect-transport
    /// idempotent at the protocol level
    connected_transports: HashSet<TransportId>,
    closed: bool,
}

impl Peer {
    pub fn new(identity: PeerIdentity) -> Self {
        Self {
            identity,
            send_transport: None,
            recv_transport: None,
            producers: HashMap::new(),
            consumers: HashMap::new(),
            connected_transports: HashSet::new(),
            closed: false,
        }
    }

    pub const fn identity(&self) -> &PeerIdentity {
        &self.identity
    }

    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(Error::InvalidState("Peer is closed".to_string()))
        } else {
            Ok(())
        }
    }

    /// Install a transport, at most once per direction.
    pub fn set_transport(
        &mut self,
        direction: TransportDirection,
        transport: WebRtcTransport,
    ) -> Result<()> {
        self.ensure_open()?;
        let slot = match direction {
            TransportDirection::Send => &mut self.send_transport,
            TransportDirection::Recv => &mut self.recv_transport,
        };
        if slot.is_some() {
            return Err(Error::InvalidState(format!(
                "{direction:?} transport already created"
            )));
        }
        *slot = Some(transport);
        Ok(())
    }

    /// Transport lookup by id, for connect-transport.
    pub fn transport_by_id(&self, transport_id: &TransportId) -> Option<WebRtcTransport> {
        [self.send_transport.as_ref(), self.recv_transport.as_ref()]
            .into_iter()
            .flatten()
            .find(|t| &t.id() == transport_id)
            .cloned()
    }

    /// The send transport, which must match `transport_id`.
    pub fn send_transport_checked(&self, transport_id: &TransportId) -> Result<WebRtcTransport> {
        self.ensure_open()?;
        match &self.send_transport {
            Some(t) if &t.id() == transport_id => Ok(t.clone()),
            Some(_) => Err(Error::InvalidArgument(
                "Transport is not this peer's send transport".to_string(),
            )),
            None => Err(Error::InvalidState(
                "Send transport not created".to_string(),
            )),
        }
    }

    pub fn is_transport_connected(&self, transport_id: &TransportId) -> bool {
        self.connected_transports.contains(transport_id)
    }

    pub fn mark_transport_connected(&mut self, transport_id: TransportId) {
        self.connected_transports.insert(transport_id);
    }

    pub fn recv_transport(&self) -> Result<WebRtcTransport> {
        self.ensure_open()?;
        self.recv_transport
            .clone()
            .ok_or_else(|| Error::InvalidState("Recv transport not created".to_string()))
    }

    pub fn add_producer(&mut self, handle: ProducerHandle) -> Result<()> {
        self.ensure_open()?;
        self.producers.insert(handle.producer.id(), handle);
        Ok(())
    }

    /// Remove (and thereby close) a producer. Returns its metadata for the
    /// `producer-closed` fan-out.
    pub fn remove_producer(&mut self, producer_id: &ProducerId) -> Option<ProducerHandle> {
        self.producers.remove(producer_id)
    }

    pub fn producer(&self, producer_id: &ProducerId) -> Option<&ProducerHandle> {
        self.producers.get(producer_id)
    }

    pub fn producer_mut(&mut self, producer_id: &ProducerId) -> Option<&mut ProducerHandle> {
        self.producers.get_mut(producer_id)
    }

    pub fn has_producer_of_type(&self, app_type: MediaAppType) -> bool {
        self.producers.values().any(|p| p.app_type == app_type)
    }

    pub fn producer_ids(&self) -> Vec<ProducerId> {
        self.producers.keys().copied().collect()
    }

    /// (producer_id, kind, app_type, paused) snapshot for roster payloads.
    pub fn producer_summaries(&self) -> Vec<(ProducerId, MediaKind, MediaAppType, bool)> {
        self.producers
            .values()
            .map(|p| (p.producer.id(), p.producer.kind(), p.app_type, p.paused))
            .collect()
    }

    pub fn add_consumer(&mut self, consumer: Consumer) -> Result<()> {
        self.ensure_open()?;
        self.consumers.insert(consumer.id(), consumer);
        Ok(())
    }

    pub fn consumer(&self, consumer_id: &ConsumerId) -> Option<Consumer> {
        self.consumers.get(consumer_id).cloned()
    }

    pub fn remove_consumer(&mut self, consumer_id: &ConsumerId) -> Option<Consumer> {
        self.consumers.remove(consumer_id)
    }

    /// Close everything this peer owns: consumers and producers first, then
    /// both transports (a dropped transport cascade-closes whatever was
    /// still on it). Idempotent.
    pub fn close(&mut self) -> Vec<(ProducerId, MediaAppType)> {
        if self.closed {
            return Vec::new();
        }
        self.closed = true;

        let closed_producers = self
            .producers
            .values()
            .map(|p| (p.producer.id(), p.app_type))
            .collect();

        self.consumers.clear();
        self.producers.clear();
        self.connected_transports.clear();
        self.send_transport = None;
        self.recv_transport = None;

        closed_producers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> PeerIdentity {
        PeerIdentity {
            conn_id: ConnId::new(),
            user_id: UserId::new(),
            participant_id: ParticipantId::new(),
            name: "Alice".to_string(),
        }
    }

    #[test]
    fn test_close_is_idempotent_and_fatal() {
        let mut peer = Peer::new(identity());
        assert!(!peer.is_closed());

        assert!(peer.close().is_empty());
        assert!(peer.is_closed());
        assert!(peer.close().is_empty());

        // Operations on a closed peer fail
        assert!(matches!(
            peer.recv_transport(),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_no_screen_producer_initially() {
        let peer = Peer::new(identity());
        assert!(!peer.has_producer_of_type(MediaAppType::Screen));
        assert!(peer.producer_ids().is_empty());
    }
}
