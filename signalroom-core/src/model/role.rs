use serde::{Deserialize, Serialize};
use std::fmt;

/// The side a connection plays inside its room.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Sender,
    Viewer,
}

impl Role {
    /// Liberal role check: only the exact string `"sender"` makes a sender,
    /// every other value joins as a viewer.
    pub fn from_wire(value: &serde_json::Value) -> Self {
        match value.as_str() {
            Some("sender") => Role::Sender,
            _ => Role::Viewer,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Sender => "sender",
            Role::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
