mod connection_id;
mod role;
mod room_id;
mod signaling;

pub use connection_id::ConnectionId;
pub use role::Role;
pub use room_id::RoomId;
pub use signaling::{ClientMessage, ServerMessage, SignalKind};
