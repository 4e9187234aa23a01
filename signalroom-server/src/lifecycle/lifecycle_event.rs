use chrono::{DateTime, Utc};
use serde::Serialize;
use signalroom_core::{ConnectionId, Role, RoomId};
use std::fmt;
use std::net::SocketAddr;

/// Advisory metadata captured when a connection is accepted. Never used for
/// routing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConnectionMeta {
    pub remote_addr: Option<SocketAddr>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// The peer closed, errored, or its socket task ended.
    Closed,
    /// No pong arrived between two heartbeat ticks.
    HeartbeatTimeout,
    /// The server is shutting down.
    Shutdown,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CloseReason::Closed => "closed",
            CloseReason::HeartbeatTimeout => "heartbeat_timeout",
            CloseReason::Shutdown => "shutdown",
        })
    }
}

/// Published by the hub for collaborators such as session loggers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    Connected {
        connection_id: ConnectionId,
        meta: ConnectionMeta,
        at: DateTime<Utc>,
    },
    Joined {
        connection_id: ConnectionId,
        room_id: RoomId,
        role: Role,
        at: DateTime<Utc>,
    },
    Disconnected {
        connection_id: ConnectionId,
        room_id: Option<RoomId>,
        role: Option<Role>,
        reason: CloseReason,
        at: DateTime<Utc>,
    },
}

impl LifecycleEvent {
    pub fn connection_id(&self) -> ConnectionId {
        match self {
            LifecycleEvent::Connected { connection_id, .. }
            | LifecycleEvent::Joined { connection_id, .. }
            | LifecycleEvent::Disconnected { connection_id, .. } => *connection_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LifecycleEvent::Connected { .. } => "connected",
            LifecycleEvent::Joined { .. } => "joined",
            LifecycleEvent::Disconnected { .. } => "disconnected",
        }
    }
}
