use crate::transport::Outbound;
use signalroom_core::{ConnectionId, Role, RoomId, ServerMessage};
use tokio::sync::mpsc;
use tracing::trace;

/// Server-side record of one open connection.
///
/// The socket itself is owned by the connection's writer task; this record
/// only holds the channel feeding that task.
#[derive(Debug)]
pub struct ConnectionState {
    id: ConnectionId,
    membership: Option<(RoomId, Role)>,
    alive: bool,
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl ConnectionState {
    pub fn new(id: ConnectionId, outbound: mpsc::UnboundedSender<Outbound>) -> Self {
        Self {
            id,
            membership: None,
            alive: true,
            outbound,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn role(&self) -> Option<Role> {
        self.membership.as_ref().map(|(_, role)| *role)
    }

    pub fn room_id(&self) -> Option<&RoomId> {
        self.membership.as_ref().map(|(room_id, _)| room_id)
    }

    pub fn membership(&self) -> Option<(&RoomId, Role)> {
        self.membership.as_ref().map(|(room_id, role)| (room_id, *role))
    }

    /// Binds room and role. Returns `false` and leaves the existing binding
    /// untouched if the connection has already joined.
    pub fn bind(&mut self, room_id: RoomId, role: Role) -> bool {
        if self.membership.is_some() {
            return false;
        }
        self.membership = Some((room_id, role));
        true
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn mark_alive(&mut self) {
        self.alive = true;
    }

    /// Clears the liveness flag and sends a ping; the pong sets it again.
    pub fn ping(&mut self) {
        self.alive = false;
        self.push(Outbound::Ping);
    }

    pub fn send(&self, message: &ServerMessage) {
        self.send_text(message.to_json());
    }

    pub fn send_text(&self, text: String) {
        self.push(Outbound::Text(text));
    }

    pub fn close(&self) {
        self.push(Outbound::Close);
    }

    pub fn terminate(&self) {
        self.push(Outbound::Terminate);
    }

    pub fn is_open(&self) -> bool {
        !self.outbound.is_closed()
    }

    // A closed writer means the socket is already gone; nothing to report.
    fn push(&self, outbound: Outbound) {
        if self.outbound.send(outbound).is_err() {
            trace!(connection_id = %self.id, "dropping frame for closed connection");
        }
    }
}
