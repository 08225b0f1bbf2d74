//! Per-meeting media aggregate.
//!
//! One main router plus one router per breakout, with a peer map per scope.
//! A connection appears in at most one scope at a time; producers and
//! consumers interconnect only within their scope, which is what isolates
//! breakouts from the main room and from each other.
//!
//! Guard discipline: the interior lock protects the peer maps, the breakout
//! maps and the router handles, and is never held across an `.await`. Engine
//! calls run on handles cloned under the guard, and every post-`.await`
//! registration re-checks the world under the guard before committing.

use mediasoup::prelude::*;
use mediasoup::router::RouterOptions;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use parley_core::models::{BreakoutRoomId, ConnId, MeetingId, ParticipantId};
use parley_core::{Error, Result};
use parley_sfu::{media_codecs, WorkerPool};

use super::peer::{MediaAppType, Peer, PeerIdentity, ProducerHandle, TransportDirection};

/// Which peer map of the room a connection sits in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Main,
    Breakout(BreakoutRoomId),
}

/// ICE/DTLS parameters returned verbatim to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportParams {
    pub id: TransportId,
    pub ice_parameters: IceParameters,
    pub ice_candidates: Vec<IceCandidate>,
    pub dtls_parameters: DtlsParameters,
}

/// The producer's wire-level `appData`, echoed to consumers.
#[derive(Debug, Clone, Serialize)]
pub struct ProducerAppData {
    #[serde(rename = "type")]
    pub kind: MediaAppType,
}

/// Consumer creation result; `app_data` is the producer's, not the
/// consumer's.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumeParams {
    pub id: ConsumerId,
    pub producer_id: ProducerId,
    pub kind: MediaKind,
    pub rtp_parameters: RtpParameters,
    pub app_data: ProducerAppData,
}

/// A producer already live in the scope, handed to newly joining peers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingProducer {
    pub participant_id: ParticipantId,
    pub producer_id: ProducerId,
    pub kind: MediaKind,
    pub app_type: MediaAppType,
    pub paused: bool,
}

/// A peer that was torn down and reseated in another scope. The caller
/// fans out `producer-closed` for the old producers and instructs the client
/// to renegotiate on the new router.
pub struct ReseatedPeer {
    pub identity: PeerIdentity,
    pub closed_producers: Vec<(ProducerId, MediaAppType)>,
}

struct BreakoutScope {
    router: Router,
    peers: HashMap<ConnId, Peer>,
}

struct RoomInner {
    router: Router,
    main_peers: HashMap<ConnId, Peer>,
    breakouts: HashMap<BreakoutRoomId, BreakoutScope>,
    closed: bool,
}

impl RoomInner {
    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(Error::InvalidState("Room is closed".to_string()))
        } else {
            Ok(())
        }
    }

    fn scope_of(&self, conn_id: &ConnId) -> Option<Scope> {
        if self.main_peers.contains_key(conn_id) {
            return Some(Scope::Main);
        }
        self.breakouts
            .iter()
            .find(|(_, scope)| scope.peers.contains_key(conn_id))
            .map(|(id, _)| Scope::Breakout(id.clone()))
    }

    fn router_of(&self, scope: &Scope) -> Option<&Router> {
        match scope {
            Scope::Main => Some(&self.router),
            Scope::Breakout(id) => self.breakouts.get(id).map(|s| &s.router),
        }
    }

    fn peers_of(&self, scope: &Scope) -> Option<&HashMap<ConnId, Peer>> {
        match scope {
            Scope::Main => Some(&self.main_peers),
            Scope::Breakout(id) => self.breakouts.get(id).map(|s| &s.peers),
        }
    }

    fn peer(&self, conn_id: &ConnId) -> Option<&Peer> {
        self.main_peers.get(conn_id).or_else(|| {
            self.breakouts
                .values()
                .find_map(|scope| scope.peers.get(conn_id))
        })
    }

    fn peer_mut(&mut self, conn_id: &ConnId) -> Option<&mut Peer> {
        if self.main_peers.contains_key(conn_id) {
            return self.main_peers.get_mut(conn_id);
        }
        self.breakouts
            .values_mut()
            .find_map(|scope| scope.peers.get_mut(conn_id))
    }

    /// Is any peer of the scope (other than `except`) publishing a screen?
    fn scope_has_screen(&self, scope: &Scope, except: Option<&ConnId>) -> bool {
        self.peers_of(scope).is_some_and(|peers| {
            peers
                .iter()
                .filter(|(conn_id, _)| Some(*conn_id) != except)
                .any(|(_, peer)| peer.has_producer_of_type(MediaAppType::Screen))
        })
    }

    /// Find a producer within one scope: owner connection, owner
    /// participant, app type.
    fn find_producer(
        &self,
        scope: &Scope,
        producer_id: &ProducerId,
    ) -> Option<(ConnId, ParticipantId, MediaAppType)> {
        let peers = self.peers_of(scope)?;
        peers.iter().find_map(|(conn_id, peer)| {
            peer.producer(producer_id).map(|handle| {
                (
                    conn_id.clone(),
                    peer.identity().participant_id.clone(),
                    handle.app_type,
                )
            })
        })
    }
}

pub struct MediaRoom {
    meeting_id: MeetingId,
    meeting_code: String,
    pool: Arc<WorkerPool>,
    inner: Mutex<RoomInner>,
}

impl MediaRoom {
    /// Create the room with its main router on the next pool worker.
    pub async fn create(
        meeting_id: MeetingId,
        meeting_code: String,
        pool: Arc<WorkerPool>,
    ) -> Result<Arc<Self>> {
        let worker = pool
            .next_worker()
            .map_err(|e| Error::Upstream(e.to_string()))?;
        let router = worker
            .create_router(RouterOptions::new(media_codecs()))
            .await
            .map_err(|e| Error::Upstream(format!("Failed to create router: {e}")))?;

        info!(meeting_code = %meeting_code, "Media room created");

        Ok(Arc::new(Self {
            meeting_id,
            meeting_code,
            pool,
            inner: Mutex::new(RoomInner {
                router,
                main_peers: HashMap::new(),
                breakouts: HashMap::new(),
                closed: false,
            }),
        }))
    }

    pub const fn meeting_id(&self) -> &MeetingId {
        &self.meeting_id
    }

    pub fn meeting_code(&self) -> &str {
        &self.meeting_code
    }

    /// Seat a fresh peer in the main scope.
    pub fn add_peer(&self, identity: PeerIdentity) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_open()?;
        if inner.scope_of(&identity.conn_id).is_some() {
            return Err(Error::InvalidState(
                "Connection already has a peer in this room".to_string(),
            ));
        }
        inner
            .main_peers
            .insert(identity.conn_id.clone(), Peer::new(identity));
        Ok(())
    }

    /// Remove and close a peer wherever it sits. Returns what was closed so
    /// the caller can fan out `producer-closed` events, which therefore
    /// always happen after the producers left the peer's set.
    pub fn remove_peer(&self, conn_id: &ConnId) -> Option<ReseatedPeer> {
        let mut inner = self.inner.lock();

        let mut peer = if let Some(peer) = inner.main_peers.remove(conn_id) {
            peer
        } else {
            let breakout = inner
                .breakouts
                .values_mut()
                .find(|scope| scope.peers.contains_key(conn_id))?;
            breakout.peers.remove(conn_id)?
        };

        let closed_producers = peer.close();
        Some(ReseatedPeer {
            identity: peer.identity().clone(),
            closed_producers,
        })
    }

    pub fn scope_of(&self, conn_id: &ConnId) -> Option<Scope> {
        self.inner.lock().scope_of(conn_id)
    }

    /// RTP capabilities of the router serving this connection's scope.
    pub fn router_capabilities_for(&self, conn_id: &ConnId) -> Result<RtpCapabilitiesFinalized> {
        let inner = self.inner.lock();
        let scope = inner
            .scope_of(conn_id)
            .ok_or_else(|| Error::NotFound("Peer not found".to_string()))?;
        Ok(inner
            .router_of(&scope)
            .ok_or_else(|| Error::Internal("Scope has no router".to_string()))?
            .rtp_capabilities()
            .clone())
    }

    pub fn main_router_capabilities(&self) -> RtpCapabilitiesFinalized {
        self.inner.lock().router.rtp_capabilities().clone()
    }

    /// Producers of every other peer in this connection's scope.
    pub fn existing_producers_for(&self, conn_id: &ConnId) -> Vec<ExistingProducer> {
        let inner = self.inner.lock();
        let Some(scope) = inner.scope_of(conn_id) else {
            return Vec::new();
        };
        let Some(peers) = inner.peers_of(&scope) else {
            return Vec::new();
        };

        peers
            .iter()
            .filter(|(id, _)| *id != conn_id)
            .flat_map(|(_, peer)| {
                let participant_id = peer.identity().participant_id.clone();
                peer.producer_summaries().into_iter().map(
                    move |(producer_id, kind, app_type, paused)| ExistingProducer {
                        participant_id: participant_id.clone(),
                        producer_id,
                        kind,
                        app_type,
                        paused,
                    },
                )
            })
            .collect()
    }

    /// Create a transport for one direction on the scope's router.
    pub async fn create_transport(
        &self,
        conn_id: &ConnId,
        direction: TransportDirection,
    ) -> Result<TransportParams> {
        let router = {
            let inner = self.inner.lock();
            inner.ensure_open()?;
            let scope = inner
                .scope_of(conn_id)
                .ok_or_else(|| Error::NotFound("Peer not found".to_string()))?;
            inner
                .router_of(&scope)
                .ok_or_else(|| Error::Internal("Scope has no router".to_string()))?
                .clone()
        };

        let options = self
            .pool
            .transport_options()
            .map_err(|e| Error::Internal(e.to_string()))?;
        let transport = router
            .create_webrtc_transport(options)
            .await
            .map_err(|e| Error::Upstream(format!("Failed to create transport: {e}")))?;

        if let Err(e) = transport
            .set_max_incoming_bitrate(self.pool.max_incoming_bitrate())
            .await
        {
            warn!(error = %e, "Failed to cap incoming bitrate");
        }

        let params = TransportParams {
            id: transport.id(),
            ice_parameters: transport.ice_parameters().clone(),
            ice_candidates: transport.ice_candidates().clone(),
            dtls_parameters: transport.dtls_parameters(),
        };

        // Re-take the guard; the peer may have left during the engine call,
        // in which case the transport drops closed right here.
        let mut inner = self.inner.lock();
        let peer = inner
            .peer_mut(conn_id)
            .ok_or_else(|| Error::NotFound("Peer not found".to_string()))?;
        peer.set_transport(direction, transport)?;

        Ok(params)
    }

    /// Complete the DTLS handshake. Idempotent: a repeat call for an
    /// already-connected transport succeeds without touching the engine.
    pub async fn connect_transport(
        &self,
        conn_id: &ConnId,
        transport_id: &TransportId,
        dtls_parameters: DtlsParameters,
    ) -> Result<()> {
        let transport = {
            let inner = self.inner.lock();
            let peer = inner
                .peer(conn_id)
                .ok_or_else(|| Error::NotFound("Peer not found".to_string()))?;
            if peer.is_transport_connected(transport_id) {
                return Ok(());
            }
            peer.transport_by_id(transport_id)
                .ok_or_else(|| Error::NotFound("Transport not found".to_string()))?
        };

        transport
            .connect(WebRtcTransportRemoteParameters { dtls_parameters })
            .await
            .map_err(|e| Error::Upstream(format!("DTLS connect failed: {e}")))?;

        let mut inner = self.inner.lock();
        if let Some(peer) = inner.peer_mut(conn_id) {
            peer.mark_transport_connected(*transport_id);
        }
        Ok(())
    }

    /// Create a producer on the peer's send transport. At most one screen
    /// producer may exist per scope; the check runs before and after the
    /// engine call since another peer may have won the race in between.
    pub async fn create_producer(
        &self,
        conn_id: &ConnId,
        transport_id: &TransportId,
        kind: MediaKind,
        rtp_parameters: RtpParameters,
        app_type: MediaAppType,
    ) -> Result<ProducerId> {
        let transport = {
            let inner = self.inner.lock();
            inner.ensure_open()?;
            let scope = inner
                .scope_of(conn_id)
                .ok_or_else(|| Error::NotFound("Peer not found".to_string()))?;
            if app_type == MediaAppType::Screen && inner.scope_has_screen(&scope, Some(conn_id)) {
                return Err(Error::AlreadyExists(
                    "Someone is already sharing their screen".to_string(),
                ));
            }
            let peer = inner
                .peer(conn_id)
                .ok_or_else(|| Error::NotFound("Peer not found".to_string()))?;
            peer.send_transport_checked(transport_id)?
        };

        let producer = transport
            .produce(ProducerOptions::new(kind, rtp_parameters))
            .await
            .map_err(|e| Error::InvalidArgument(format!("Failed to produce: {e}")))?;
        let producer_id = producer.id();

        let mut inner = self.inner.lock();
        let Some(scope) = inner.scope_of(conn_id) else {
            // Peer left while the engine call was in flight
            return Err(Error::NotFound("Peer not found".to_string()));
        };
        if app_type == MediaAppType::Screen && inner.scope_has_screen(&scope, Some(conn_id)) {
            return Err(Error::AlreadyExists(
                "Someone is already sharing their screen".to_string(),
            ));
        }
        inner
            .peer_mut(conn_id)
            .ok_or_else(|| Error::NotFound("Peer not found".to_string()))?
            .add_producer(ProducerHandle {
                producer,
                app_type,
                paused: false,
            })?;

        Ok(producer_id)
    }

    /// Create a paused consumer for a producer in the same scope. Fails with
    /// `CodecIncompatible` when the probe rejects the client capabilities,
    /// and re-checks producer existence after the engine call so a departing
    /// producer cannot leave an orphan consumer behind.
    pub async fn create_consumer(
        &self,
        conn_id: &ConnId,
        producer_id: ProducerId,
        rtp_capabilities: RtpCapabilities,
    ) -> Result<ConsumeParams> {
        let (transport, app_type) = {
            let inner = self.inner.lock();
            inner.ensure_open()?;
            let scope = inner
                .scope_of(conn_id)
                .ok_or_else(|| Error::NotFound("Peer not found".to_string()))?;
            let (owner_conn, _, app_type) = inner
                .find_producer(&scope, &producer_id)
                .ok_or_else(|| Error::NotFound("Producer not found".to_string()))?;
            if &owner_conn == conn_id {
                return Err(Error::InvalidArgument(
                    "Cannot consume your own producer".to_string(),
                ));
            }
            let router = inner
                .router_of(&scope)
                .ok_or_else(|| Error::Internal("Scope has no router".to_string()))?;
            if !router.can_consume(&producer_id, &rtp_capabilities) {
                return Err(Error::CodecIncompatible);
            }
            let peer = inner
                .peer(conn_id)
                .ok_or_else(|| Error::NotFound("Peer not found".to_string()))?;
            (peer.recv_transport()?, app_type)
        };

        let mut options = ConsumerOptions::new(producer_id, rtp_capabilities);
        options.paused = true;

        let consumer = transport
            .consume(options)
            .await
            .map_err(|e| Error::Upstream(format!("Failed to consume: {e}")))?;

        let params = ConsumeParams {
            id: consumer.id(),
            producer_id,
            kind: consumer.kind(),
            rtp_parameters: consumer.rtp_parameters().clone(),
            app_data: ProducerAppData { kind: app_type },
        };

        let mut inner = self.inner.lock();
        let scope = inner
            .scope_of(conn_id)
            .ok_or_else(|| Error::NotFound("Peer not found".to_string()))?;
        if inner.find_producer(&scope, &producer_id).is_none() {
            // Producer closed while the engine call was in flight; dropping
            // the consumer here closes it
            return Err(Error::NotFound("Producer not found".to_string()));
        }
        inner
            .peer_mut(conn_id)
            .ok_or_else(|| Error::NotFound("Peer not found".to_string()))?
            .add_consumer(consumer)?;

        Ok(params)
    }

    /// Consumer handle for resume / preferred-layer operations.
    pub fn consumer(&self, conn_id: &ConnId, consumer_id: &ConsumerId) -> Result<Consumer> {
        let inner = self.inner.lock();
        inner
            .peer(conn_id)
            .ok_or_else(|| Error::NotFound("Peer not found".to_string()))?
            .consumer(consumer_id)
            .ok_or_else(|| Error::NotFound("Consumer not found".to_string()))
    }

    /// Producer handle owned by this connection.
    pub fn producer(&self, conn_id: &ConnId, producer_id: &ProducerId) -> Result<Producer> {
        let inner = self.inner.lock();
        inner
            .peer(conn_id)
            .ok_or_else(|| Error::NotFound("Peer not found".to_string()))?
            .producer(producer_id)
            .map(|h| h.producer.clone())
            .ok_or_else(|| Error::NotFound("Producer not found".to_string()))
    }

    /// Record the paused bit after a successful engine pause/resume.
    pub fn set_producer_paused(&self, conn_id: &ConnId, producer_id: &ProducerId, paused: bool) {
        let mut inner = self.inner.lock();
        if let Some(handle) = inner
            .peer_mut(conn_id)
            .and_then(|peer| peer.producer_mut(producer_id))
        {
            handle.paused = paused;
        }
    }

    /// Remove and close one producer, returning its app type for the
    /// `producer-closed` fan-out.
    pub fn close_producer(&self, conn_id: &ConnId, producer_id: &ProducerId) -> Result<MediaAppType> {
        let mut inner = self.inner.lock();
        let handle = inner
            .peer_mut(conn_id)
            .ok_or_else(|| Error::NotFound("Peer not found".to_string()))?
            .remove_producer(producer_id)
            .ok_or_else(|| Error::NotFound("Producer not found".to_string()))?;
        Ok(handle.app_type)
    }

    /// Create a breakout router on the next pool worker.
    pub async fn create_breakout_router(
        &self,
        breakout_id: BreakoutRoomId,
    ) -> Result<RtpCapabilitiesFinalized> {
        let worker = self
            .pool
            .next_worker()
            .map_err(|e| Error::Upstream(e.to_string()))?;
        let router = worker
            .create_router(RouterOptions::new(media_codecs()))
            .await
            .map_err(|e| Error::Upstream(format!("Failed to create breakout router: {e}")))?;

        let mut inner = self.inner.lock();
        inner.ensure_open()?;
        let capabilities = router.rtp_capabilities().clone();
        inner.breakouts.insert(
            breakout_id,
            BreakoutScope {
                router,
                peers: HashMap::new(),
            },
        );
        Ok(capabilities)
    }

    /// Tear the peer out of the main scope and reseat a fresh one, with the
    /// same identity, in the breakout. All media state is destroyed; the
    /// caller instructs the client to renegotiate on the returned router
    /// capabilities.
    pub fn move_peer_to_breakout(
        &self,
        conn_id: &ConnId,
        breakout_id: &BreakoutRoomId,
    ) -> Result<(ReseatedPeer, RtpCapabilitiesFinalized)> {
        let mut inner = self.inner.lock();
        inner.ensure_open()?;

        if !inner.main_peers.contains_key(conn_id) {
            return Err(Error::NotFound("Peer not in the main scope".to_string()));
        }
        let Some(scope) = inner.breakouts.get_mut(breakout_id) else {
            return Err(Error::NotFound("Breakout room not found".to_string()));
        };
        let capabilities = scope.router.rtp_capabilities().clone();

        // Removed only after the breakout lookup, so a missing breakout
        // leaves the peer seated in main
        let mut peer = inner
            .main_peers
            .remove(conn_id)
            .ok_or_else(|| Error::NotFound("Peer not in the main scope".to_string()))?;

        let closed_producers = peer.close();
        let identity = peer.identity().clone();

        inner
            .breakouts
            .get_mut(breakout_id)
            .ok_or_else(|| Error::NotFound("Breakout room not found".to_string()))?
            .peers
            .insert(conn_id.clone(), Peer::new(identity.clone()));

        Ok((
            ReseatedPeer {
                identity,
                closed_producers,
            },
            capabilities,
        ))
    }

    /// Mirror of `move_peer_to_breakout`.
    pub fn move_peer_to_main(
        &self,
        conn_id: &ConnId,
    ) -> Result<(ReseatedPeer, RtpCapabilitiesFinalized)> {
        let mut inner = self.inner.lock();
        inner.ensure_open()?;

        let mut peer = inner
            .breakouts
            .values_mut()
            .find_map(|scope| scope.peers.remove(conn_id))
            .ok_or_else(|| Error::NotFound("Peer not in a breakout".to_string()))?;

        let closed_producers = peer.close();
        let identity = peer.identity().clone();

        inner
            .main_peers
            .insert(conn_id.clone(), Peer::new(identity.clone()));
        let capabilities = inner.router.rtp_capabilities().clone();

        Ok((
            ReseatedPeer {
                identity,
                closed_producers,
            },
            capabilities,
        ))
    }

    /// Close every breakout: peers are closed and reseated in the main
    /// scope, breakout routers drop closed. Returns the reseated peers so
    /// the caller can instruct each to renegotiate on the main router.
    pub fn close_all_breakouts(&self) -> Vec<ReseatedPeer> {
        let mut inner = self.inner.lock();
        let breakouts = std::mem::take(&mut inner.breakouts);

        let mut reseated = Vec::new();
        for (_, scope) in breakouts {
            for (conn_id, mut peer) in scope.peers {
                let closed_producers = peer.close();
                let identity = peer.identity().clone();
                inner
                    .main_peers
                    .insert(conn_id, Peer::new(identity.clone()));
                reseated.push(ReseatedPeer {
                    identity,
                    closed_producers,
                });
            }
            // scope.router drops here, closing it
        }
        reseated
    }

    pub fn is_empty(&self) -> bool {
        let inner = self.inner.lock();
        inner.main_peers.is_empty() && inner.breakouts.values().all(|s| s.peers.is_empty())
    }

    /// Close every peer in every scope, then the breakout routers, then the
    /// main router (when the room itself drops). Idempotent.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        if inner.closed {
            return;
        }
        inner.closed = true;

        for peer in inner.main_peers.values_mut() {
            peer.close();
        }
        inner.main_peers.clear();

        let breakouts = std::mem::take(&mut inner.breakouts);
        for (_, mut scope) in breakouts {
            for peer in scope.peers.values_mut() {
                peer.close();
            }
        }

        info!(meeting_code = %self.meeting_code, "Media room closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::models::UserId;
    use parley_sfu::SfuConfig;

    fn identity() -> PeerIdentity {
        PeerIdentity {
            conn_id: ConnId::new(),
            user_id: UserId::new(),
            participant_id: ParticipantId::new(),
            name: "Alice".to_string(),
        }
    }

    async fn room() -> Arc<MediaRoom> {
        let pool = WorkerPool::new(SfuConfig {
            num_workers: 1,
            ..SfuConfig::default()
        })
        .await
        .unwrap();
        MediaRoom::create(MeetingId::new(), "abc-defg-hij".to_string(), pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    #[ignore = "Requires mediasoup-worker binary"]
    async fn test_peer_in_exactly_one_scope() {
        let room = room().await;
        let alice = identity();
        room.add_peer(alice.clone()).unwrap();
        assert_eq!(room.scope_of(&alice.conn_id), Some(Scope::Main));

        // Seating the same connection twice is a bug, not a user error
        assert!(room.add_peer(alice.clone()).is_err());

        let breakout = BreakoutRoomId::new();
        room.create_breakout_router(breakout.clone()).await.unwrap();
        room.move_peer_to_breakout(&alice.conn_id, &breakout)
            .unwrap();
        assert_eq!(
            room.scope_of(&alice.conn_id),
            Some(Scope::Breakout(breakout))
        );
        assert!(!room.is_empty());

        // And back again: the reseated peer carries the same identity but
        // none of the old media state
        let (reseated, _caps) = room.move_peer_to_main(&alice.conn_id).unwrap();
        assert_eq!(reseated.identity.participant_id, alice.participant_id);
        assert_eq!(room.scope_of(&alice.conn_id), Some(Scope::Main));
        assert!(room.move_peer_to_main(&alice.conn_id).is_err());
    }

    #[tokio::test]
    #[ignore = "Requires mediasoup-worker binary"]
    async fn test_close_all_breakouts_reseats_everyone() {
        let room = room().await;
        let alice = identity();
        let bob = identity();
        room.add_peer(alice.clone()).unwrap();
        room.add_peer(bob.clone()).unwrap();

        let breakout = BreakoutRoomId::new();
        room.create_breakout_router(breakout.clone()).await.unwrap();
        room.move_peer_to_breakout(&alice.conn_id, &breakout)
            .unwrap();
        room.move_peer_to_breakout(&bob.conn_id, &breakout).unwrap();

        let reseated = room.close_all_breakouts();
        assert_eq!(reseated.len(), 2);
        assert_eq!(room.scope_of(&alice.conn_id), Some(Scope::Main));
        assert_eq!(room.scope_of(&bob.conn_id), Some(Scope::Main));
    }

    #[tokio::test]
    #[ignore = "Requires mediasoup-worker binary"]
    async fn test_remove_peer_reports_closed_producers() {
        let room = room().await;
        let alice = identity();
        room.add_peer(alice.clone()).unwrap();

        let removed = room.remove_peer(&alice.conn_id).unwrap();
        assert!(removed.closed_producers.is_empty());
        assert!(room.is_empty());
        assert!(room.remove_peer(&alice.conn_id).is_none());
    }
}
