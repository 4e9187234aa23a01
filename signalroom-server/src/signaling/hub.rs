use crate::connection::{ConnectionState, ConnectionTable};
use crate::error::RelayError;
use crate::heartbeat;
use crate::lifecycle::{CloseReason, ConnectionMeta, EventBus, LifecycleEvent};
use crate::room::RoomRegistry;
use crate::signaling::{Dispatch, MessageRouter};
use crate::transport::Outbound;
use chrono::Utc;
use signalroom_core::{ClientMessage, ConnectionId, RoomId};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Mailbox size of the hub actor.
const HUB_CHANNEL_BUFFER: usize = 1024;

/// Commands accepted by the hub from socket tasks and the heartbeat timer.
#[derive(Debug)]
pub enum HubCommand {
    Connect {
        connection_id: ConnectionId,
        outbound: mpsc::UnboundedSender<Outbound>,
        meta: ConnectionMeta,
    },
    Frame {
        connection_id: ConnectionId,
        text: String,
    },
    Pong {
        connection_id: ConnectionId,
    },
    Disconnect {
        connection_id: ConnectionId,
    },
    Sweep,
    Snapshot {
        respond_to: oneshot::Sender<HubSnapshot>,
    },
    Shutdown {
        done: oneshot::Sender<()>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub senders: Vec<ConnectionId>,
    pub viewers: Vec<ConnectionId>,
}

/// Point-in-time copy of the hub's membership state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HubSnapshot {
    pub connections: usize,
    pub rooms: Vec<RoomSnapshot>,
}

impl HubSnapshot {
    pub fn room(&self, room_id: &str) -> Option<&RoomSnapshot> {
        self.rooms.iter().find(|r| r.room_id.as_str() == room_id)
    }
}

/// Owner of every room and connection record.
///
/// All mutation goes through `&mut self`; when spawned, the hub becomes the
/// single task that applies commands in arrival order.
pub struct Hub {
    rooms: RoomRegistry,
    connections: ConnectionTable,
    events: EventBus,
}

impl Hub {
    pub fn new(events: EventBus) -> Self {
        Self {
            rooms: RoomRegistry::new(),
            connections: ConnectionTable::new(),
            events,
        }
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    pub fn connections(&self) -> &ConnectionTable {
        &self.connections
    }

    pub fn connect(
        &mut self,
        connection_id: ConnectionId,
        outbound: mpsc::UnboundedSender<Outbound>,
        meta: ConnectionMeta,
    ) {
        if self
            .connections
            .insert(ConnectionState::new(connection_id, outbound))
            .is_some()
        {
            warn!(%connection_id, "replaced an existing connection record");
        }
        info!(
            %connection_id,
            remote_addr = ?meta.remote_addr,
            connections = self.connections.len(),
            "new connection"
        );
        self.events.publish(LifecycleEvent::Connected {
            connection_id,
            meta,
            at: Utc::now(),
        });
    }

    pub fn handle_frame(&mut self, connection_id: ConnectionId, text: &str) -> Dispatch {
        if !self.connections.contains(&connection_id) {
            return Dispatch::Dropped;
        }
        let message = match ClientMessage::parse(text) {
            Ok(message) => message,
            Err(e) => {
                debug!(%connection_id, error = %e, "dropping malformed frame");
                return Dispatch::Dropped;
            }
        };

        let dispatch =
            MessageRouter::new(&mut self.rooms, &mut self.connections).dispatch(connection_id, message);

        if let Dispatch::Joined { room_id, role } = &dispatch {
            self.events.publish(LifecycleEvent::Joined {
                connection_id,
                room_id: room_id.clone(),
                role: *role,
                at: Utc::now(),
            });
        }
        dispatch
    }

    pub fn pong(&mut self, connection_id: ConnectionId) {
        if let Some(conn) = self.connections.get_mut(&connection_id) {
            conn.mark_alive();
        }
    }

    /// One heartbeat tick. Returns the connections that were terminated.
    pub fn sweep(&mut self) -> Vec<ConnectionId> {
        let dead = heartbeat::sweep(&mut self.connections);
        for connection_id in &dead {
            warn!(%connection_id, "connection timed out, terminating");
            if let Some(conn) = self.connections.get(connection_id) {
                conn.terminate();
            }
            self.disconnect(*connection_id, CloseReason::HeartbeatTimeout);
        }
        dead
    }

    /// Forgets a connection and releases its room membership. Safe to call
    /// more than once; only the first call has any effect.
    pub fn disconnect(&mut self, connection_id: ConnectionId, reason: CloseReason) -> bool {
        let Some(conn) = self.connections.remove(&connection_id) else {
            return false;
        };
        info!(%connection_id, %reason, "connection closed");

        let membership = conn.membership().map(|(room_id, role)| (room_id.clone(), role));
        if let Some((room_id, role)) = &membership {
            MessageRouter::new(&mut self.rooms, &mut self.connections).leave(
                connection_id,
                room_id,
                *role,
            );
        }

        let (room_id, role) = membership.unzip();
        self.events.publish(LifecycleEvent::Disconnected {
            connection_id,
            room_id,
            role,
            reason,
            at: Utc::now(),
        });
        true
    }

    /// Closes every connection with a close frame and runs normal cleanup.
    pub fn shutdown(&mut self) {
        let ids = self.connections.ids();
        info!(connections = ids.len(), "closing all connections");
        for connection_id in ids {
            if let Some(conn) = self.connections.get(&connection_id) {
                conn.close();
            }
            self.disconnect(connection_id, CloseReason::Shutdown);
        }
    }

    pub fn snapshot(&self) -> HubSnapshot {
        let mut rooms: Vec<_> = self
            .rooms
            .rooms()
            .map(|room| {
                let mut senders: Vec<_> = room.senders().iter().copied().collect();
                let mut viewers: Vec<_> = room.viewers().iter().copied().collect();
                senders.sort();
                viewers.sort();
                RoomSnapshot {
                    room_id: room.id().clone(),
                    senders,
                    viewers,
                }
            })
            .collect();
        rooms.sort_by(|a, b| a.room_id.as_str().cmp(b.room_id.as_str()));

        HubSnapshot {
            connections: self.connections.len(),
            rooms,
        }
    }

    pub fn spawn(self) -> (HubHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(HUB_CHANNEL_BUFFER);
        let task = tokio::spawn(self.run(receiver));
        (HubHandle { sender }, task)
    }

    #[instrument(skip_all, name = "hub")]
    async fn run(mut self, mut commands: mpsc::Receiver<HubCommand>) {
        info!("hub event loop started");

        while let Some(command) = commands.recv().await {
            match command {
                HubCommand::Connect {
                    connection_id,
                    outbound,
                    meta,
                } => self.connect(connection_id, outbound, meta),
                HubCommand::Frame {
                    connection_id,
                    text,
                } => {
                    self.handle_frame(connection_id, &text);
                }
                HubCommand::Pong { connection_id } => self.pong(connection_id),
                HubCommand::Disconnect { connection_id } => {
                    self.disconnect(connection_id, CloseReason::Closed);
                }
                HubCommand::Sweep => {
                    self.sweep();
                }
                HubCommand::Snapshot { respond_to } => {
                    let _ = respond_to.send(self.snapshot());
                }
                HubCommand::Shutdown { done } => {
                    self.shutdown();
                    let _ = done.send(());
                    break;
                }
            }
        }

        info!(rooms = self.rooms.len(), "hub event loop finished");
    }
}

/// Cloneable address of a running hub.
#[derive(Clone, Debug)]
pub struct HubHandle {
    sender: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    pub async fn connect(
        &self,
        connection_id: ConnectionId,
        outbound: mpsc::UnboundedSender<Outbound>,
        meta: ConnectionMeta,
    ) -> Result<(), RelayError> {
        self.send(HubCommand::Connect {
            connection_id,
            outbound,
            meta,
        })
        .await
    }

    pub async fn frame(&self, connection_id: ConnectionId, text: String) -> Result<(), RelayError> {
        self.send(HubCommand::Frame {
            connection_id,
            text,
        })
        .await
    }

    pub async fn pong(&self, connection_id: ConnectionId) -> Result<(), RelayError> {
        self.send(HubCommand::Pong { connection_id }).await
    }

    pub async fn disconnect(&self, connection_id: ConnectionId) -> Result<(), RelayError> {
        self.send(HubCommand::Disconnect { connection_id }).await
    }

    pub async fn sweep(&self) -> Result<(), RelayError> {
        self.send(HubCommand::Sweep).await
    }

    pub async fn snapshot(&self) -> Result<HubSnapshot, RelayError> {
        let (respond_to, rx) = oneshot::channel();
        self.send(HubCommand::Snapshot { respond_to }).await?;
        rx.await.map_err(|_| RelayError::HubClosed)
    }

    /// Closes every connection and stops the hub once that is done.
    pub async fn shutdown(&self) -> Result<(), RelayError> {
        let (done, rx) = oneshot::channel();
        self.send(HubCommand::Shutdown { done }).await?;
        rx.await.map_err(|_| RelayError::HubClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    async fn send(&self, command: HubCommand) -> Result<(), RelayError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| RelayError::HubClosed)
    }
}
