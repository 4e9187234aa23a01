/// Instructions for a connection's socket writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// A JSON text frame.
    Text(String),
    /// Liveness check; the peer answers with a pong.
    Ping,
    /// Close handshake, used during shutdown.
    Close,
    /// Drop the socket without a close handshake.
    Terminate,
}
