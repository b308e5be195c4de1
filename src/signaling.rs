//! WebSocket signaling relay for WebRTC session negotiation

mod messages;
mod registry;
mod router;
mod server;
mod types;

pub use messages::{ClientMessage, ServerMessage};
pub use registry::Registry;
pub use router::Router;
pub use server::SignalingServer;
pub use types::{Connection, ConnectionId, OutboundMessage, SignalingError};
