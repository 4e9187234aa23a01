pub mod config;
pub mod connection;
pub mod error;
pub mod heartbeat;
pub mod lifecycle;
pub mod room;
pub mod server;
pub mod signaling;
pub mod transport;

pub use config::{Config, ConfigError};
pub use error::RelayError;
pub use heartbeat::HeartbeatMonitor;
pub use lifecycle::*;
pub use server::{AppState, SignalServer, router};
pub use signaling::{Dispatch, Hub, HubHandle, HubSnapshot, RoomSnapshot, ws_handler};
