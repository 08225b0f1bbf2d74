//! Thin adapter over the embedded media engine.
//!
//! Everything media-plane lives behind `mediasoup` handles: workers,
//! routers, WebRTC transports, producers, consumers. Entities close when
//! their last handle drops, so ownership in the room/peer tree doubles as
//! the close cascade.

pub mod codecs;
pub mod config;
pub mod pool;

pub use codecs::media_codecs;
pub use config::SfuConfig;
pub use pool::WorkerPool;
