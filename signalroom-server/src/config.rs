//! Relay server configuration.
//!
//! Loaded from environment variables; every value has a default.

use std::collections::HashMap;
use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3000;

pub const DEFAULT_BIND_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Default heartbeat period in milliseconds.
pub const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 30_000;

/// Default time shutdown waits for open sockets to flush, in milliseconds.
pub const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 5_000;

/// Default capacity of the lifecycle event channel.
pub const DEFAULT_EVENT_BUFFER: usize = 1024;

pub use crate::lifecycle::DEFAULT_JOURNAL_MAX_SESSIONS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Address the websocket listener binds to (default `0.0.0.0`).
    pub host: IpAddr,

    /// Port the websocket listener binds to; `0` picks a free port.
    pub port: u16,

    pub heartbeat_interval: Duration,

    pub shutdown_grace: Duration,

    /// Lifecycle events a slow sink may fall behind by before it starts
    /// losing them.
    pub event_buffer: usize,

    /// Session records a `SessionJournal` keeps before evicting closed ones.
    pub journal_max_sessions: usize,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_BIND_HOST,
            port: DEFAULT_PORT,
            heartbeat_interval: Duration::from_millis(DEFAULT_HEARTBEAT_INTERVAL_MS),
            shutdown_grace: Duration::from_millis(DEFAULT_SHUTDOWN_GRACE_MS),
            event_buffer: DEFAULT_EVENT_BUFFER,
            journal_max_sessions: DEFAULT_JOURNAL_MAX_SESSIONS,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = parse_var(vars, "PORT")?.unwrap_or(DEFAULT_PORT);
        let host = parse_var(vars, "BIND_HOST")?.unwrap_or(DEFAULT_BIND_HOST);

        let heartbeat_ms =
            parse_var(vars, "HEARTBEAT_INTERVAL_MS")?.unwrap_or(DEFAULT_HEARTBEAT_INTERVAL_MS);
        if heartbeat_ms == 0 {
            return Err(ConfigError::InvalidValue {
                name: "HEARTBEAT_INTERVAL_MS",
                value: heartbeat_ms.to_string(),
            });
        }

        let shutdown_grace_ms =
            parse_var(vars, "SHUTDOWN_GRACE_MS")?.unwrap_or(DEFAULT_SHUTDOWN_GRACE_MS);

        let event_buffer = parse_var(vars, "EVENT_BUFFER")?.unwrap_or(DEFAULT_EVENT_BUFFER);
        if event_buffer == 0 {
            return Err(ConfigError::InvalidValue {
                name: "EVENT_BUFFER",
                value: event_buffer.to_string(),
            });
        }

        let journal_max_sessions = parse_var(vars, "JOURNAL_MAX_SESSIONS")?
            .unwrap_or(DEFAULT_JOURNAL_MAX_SESSIONS);

        Ok(Self {
            host,
            port,
            heartbeat_interval: Duration::from_millis(heartbeat_ms),
            shutdown_grace: Duration::from_millis(shutdown_grace_ms),
            event_buffer,
            journal_max_sessions,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_var<T: FromStr>(
    vars: &HashMap<String, String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match vars.get(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                name,
                value: raw.clone(),
            }),
    }
}
