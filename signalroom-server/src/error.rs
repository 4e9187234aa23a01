use crate::config::ConfigError;
use std::net::SocketAddr;
use thiserror::Error;

/// Failures of the relay server itself. Misbehaving peers never produce one.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error("hub is no longer running")]
    HubClosed,

    #[error(transparent)]
    Config(#[from] ConfigError),
}
