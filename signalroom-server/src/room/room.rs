use signalroom_core::{ConnectionId, Role, RoomId};
use std::collections::HashSet;

/// Membership of one room. Senders and viewers are disjoint because a
/// connection's role never changes once it has joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    id: RoomId,
    senders: HashSet<ConnectionId>,
    viewers: HashSet<ConnectionId>,
}

impl Room {
    pub fn new(id: RoomId) -> Self {
        Self {
            id,
            senders: HashSet::new(),
            viewers: HashSet::new(),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn senders(&self) -> &HashSet<ConnectionId> {
        &self.senders
    }

    pub fn viewers(&self) -> &HashSet<ConnectionId> {
        &self.viewers
    }

    pub fn members(&self, role: Role) -> &HashSet<ConnectionId> {
        match role {
            Role::Sender => &self.senders,
            Role::Viewer => &self.viewers,
        }
    }

    pub fn insert(&mut self, connection_id: ConnectionId, role: Role) -> bool {
        debug_assert!(!self.members(other(role)).contains(&connection_id));
        match role {
            Role::Sender => self.senders.insert(connection_id),
            Role::Viewer => self.viewers.insert(connection_id),
        }
    }

    pub fn remove(&mut self, connection_id: &ConnectionId, role: Role) -> bool {
        match role {
            Role::Sender => self.senders.remove(connection_id),
            Role::Viewer => self.viewers.remove(connection_id),
        }
    }

    pub fn has_senders(&self) -> bool {
        !self.senders.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty() && self.viewers.is_empty()
    }
}

fn other(role: Role) -> Role {
    match role {
        Role::Sender => Role::Viewer,
        Role::Viewer => Role::Sender,
    }
}
