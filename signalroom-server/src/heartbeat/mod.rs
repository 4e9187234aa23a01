mod heartbeat_monitor;

pub use heartbeat_monitor::*;

use crate::connection::ConnectionTable;
use signalroom_core::ConnectionId;

/// Applies one liveness tick to every connection.
///
/// Connections that never answered the previous ping are returned and left
/// untouched; the rest are marked unanswered and pinged again.
pub fn sweep(connections: &mut ConnectionTable) -> Vec<ConnectionId> {
    let mut dead = Vec::new();
    for conn in connections.iter_mut() {
        if conn.is_alive() {
            conn.ping();
        } else {
            dead.push(conn.id());
        }
    }
    dead.sort();
    dead
}
