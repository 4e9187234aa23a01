use crate::connection::ConnectionTable;
use crate::room::RoomRegistry;
use serde_json::{Map, Value};
use signalroom_core::{ClientMessage, ConnectionId, Role, RoomId, ServerMessage, SignalKind};
use tracing::{debug, info, warn};

/// What happened to one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Joined { room_id: RoomId, role: Role },
    /// A second `join` on an already joined connection.
    JoinIgnored,
    Routed { delivered: usize },
    Dropped,
}

/// Applies client messages to room membership and fans signals out.
///
/// Borrows the hub's state for the duration of one command, so every join,
/// route and leave is atomic with respect to the others.
pub struct MessageRouter<'a> {
    rooms: &'a mut RoomRegistry,
    connections: &'a mut ConnectionTable,
}

impl<'a> MessageRouter<'a> {
    pub fn new(rooms: &'a mut RoomRegistry, connections: &'a mut ConnectionTable) -> Self {
        Self { rooms, connections }
    }

    pub fn dispatch(&mut self, from: ConnectionId, message: ClientMessage) -> Dispatch {
        match message {
            ClientMessage::Join { room_id, role } => self.join(from, room_id, role),
            ClientMessage::Signal { kind, to, fields } => Dispatch::Routed {
                delivered: self.route(from, kind, to.as_deref(), &fields),
            },
        }
    }

    pub fn join(&mut self, id: ConnectionId, room_id: RoomId, role: Role) -> Dispatch {
        let Some(conn) = self.connections.get_mut(&id) else {
            return Dispatch::Dropped;
        };
        if !conn.bind(room_id.clone(), role) {
            warn!(
                connection_id = %id,
                room_id = %room_id,
                bound_room = ?conn.room_id().map(RoomId::as_str),
                "ignoring repeated join"
            );
            return Dispatch::JoinIgnored;
        }

        let room = self.rooms.get_or_create(&room_id);
        room.insert(id, role);

        match role {
            Role::Sender => {
                self.connections
                    .deliver_all(room.viewers(), &ServerMessage::SenderAvailable);
                info!(
                    connection_id = %id,
                    room_id = %room_id,
                    viewers = room.viewers().len(),
                    "sender joined"
                );
            }
            Role::Viewer => {
                if room.has_senders() {
                    self.connections.deliver(&id, &ServerMessage::SenderAvailable);
                    self.connections
                        .deliver_all(room.senders(), &ServerMessage::NeedOffer { from: id });
                }
                info!(
                    connection_id = %id,
                    room_id = %room_id,
                    viewers = room.viewers().len(),
                    "viewer joined"
                );
            }
        }

        Dispatch::Joined { room_id, role }
    }

    /// Relays a negotiation message. Returns how many peers it went to.
    pub fn route(
        &self,
        from: ConnectionId,
        kind: SignalKind,
        to: Option<&str>,
        fields: &Map<String, Value>,
    ) -> usize {
        let Some((room_id, role)) = self.connections.get(&from).and_then(|c| c.membership())
        else {
            debug!(connection_id = %from, %kind, "dropping signal from connection outside a room");
            return 0;
        };
        let Some(room) = self.rooms.get(room_id.as_str()) else {
            debug!(connection_id = %from, room_id = %room_id, %kind, "dropping signal for vanished room");
            return 0;
        };

        let message = ServerMessage::relay(fields, from);
        let delivered = match (role, kind, to) {
            (Role::Sender, SignalKind::Offer, Some(target)) => {
                // Ids match only in their canonical spelling.
                match target.parse::<ConnectionId>() {
                    Ok(viewer) if room.viewers().contains(&viewer) && viewer.to_string() == target => {
                        self.connections.deliver_all([&viewer], &message)
                    }
                    _ => {
                        debug!(connection_id = %from, offer_target = target, "offer target not in room");
                        0
                    }
                }
            }
            (Role::Sender, _, _) => self.connections.deliver_all(room.viewers(), &message),
            (Role::Viewer, _, _) => self.connections.deliver_all(room.senders(), &message),
        };

        debug!(
            connection_id = %from,
            room_id = %room_id,
            %role,
            %kind,
            delivered,
            "relayed signal"
        );
        delivered
    }

    /// Removes a departing connection from its room, tells viewers when a
    /// sender leaves, and deletes the room once nobody is left.
    pub fn leave(&mut self, id: ConnectionId, room_id: &RoomId, role: Role) {
        let Some(room) = self.rooms.get_mut(room_id.as_str()) else {
            return;
        };
        room.remove(&id, role);

        match role {
            Role::Sender => {
                self.connections
                    .deliver_all(room.viewers(), &ServerMessage::SenderGone);
                info!(
                    connection_id = %id,
                    room_id = %room_id,
                    viewers = room.viewers().len(),
                    "sender left"
                );
            }
            Role::Viewer => {
                info!(
                    connection_id = %id,
                    room_id = %room_id,
                    viewers = room.viewers().len(),
                    "viewer left"
                );
            }
        }

        if room.is_empty() {
            self.rooms.remove(room_id.as_str());
            info!(room_id = %room_id, "room deleted (empty)");
        }
    }
}
