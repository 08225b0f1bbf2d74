//! Parley API layer: runtime room state, the signaling protocol engine, the
//! broadcast hub, the breakout coordinator, and the HTTP surface.

pub mod breakout;
pub mod http;
pub mod hub;
pub mod rtc;
pub mod signaling;
pub mod state;

pub use hub::{BroadcastHub, Group};
pub use state::AppState;
