pub mod peer;
pub mod registry;
pub mod room;

pub use peer::{MediaAppType, Peer, PeerIdentity, TransportDirection};
pub use registry::RoomRegistry;
pub use room::{
    ConsumeParams, ExistingProducer, MediaRoom, ProducerAppData, ReseatedPeer, Scope,
    TransportParams,
};
