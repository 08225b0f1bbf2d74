pub mod connection;
pub mod dispatch;
pub mod messages;

pub use connection::handle_socket;
pub use dispatch::{Binding, ConnectionCtx};
pub use messages::{ClientEnvelope, ClientRequest, ServerEvent};
