use crate::connection::ConnectionState;
use signalroom_core::{ConnectionId, ServerMessage};
use std::collections::HashMap;

/// Every connection the hub currently tracks, keyed by server-assigned id.
#[derive(Debug, Default)]
pub struct ConnectionTable {
    connections: HashMap<ConnectionId, ConnectionState>,
}

impl ConnectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, state: ConnectionState) -> Option<ConnectionState> {
        self.connections.insert(state.id(), state)
    }

    pub fn remove(&mut self, id: &ConnectionId) -> Option<ConnectionState> {
        self.connections.remove(id)
    }

    pub fn get(&self, id: &ConnectionId) -> Option<&ConnectionState> {
        self.connections.get(id)
    }

    pub fn get_mut(&mut self, id: &ConnectionId) -> Option<&mut ConnectionState> {
        self.connections.get_mut(id)
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn ids(&self) -> Vec<ConnectionId> {
        self.connections.keys().copied().collect()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ConnectionState> {
        self.connections.values_mut()
    }

    /// Sends `message` to one connection. Unknown ids are ignored.
    pub fn deliver(&self, id: &ConnectionId, message: &ServerMessage) -> bool {
        match self.connections.get(id) {
            Some(conn) => {
                conn.send(message);
                true
            }
            None => false,
        }
    }

    /// Sends `message` to every listed connection, encoding it once.
    pub fn deliver_all<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a ConnectionId>,
        message: &ServerMessage,
    ) -> usize {
        let text = message.to_json();
        let mut delivered = 0;
        for id in ids {
            if let Some(conn) = self.connections.get(id) {
                conn.send_text(text.clone());
                delivered += 1;
            }
        }
        delivered
    }
}
