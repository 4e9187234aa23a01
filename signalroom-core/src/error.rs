use thiserror::Error;

/// Reasons an inbound frame is dropped. Never sent back to the peer.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("frame is not a JSON object")]
    NotAnObject,

    #[error("missing \"type\" field")]
    MissingType,

    #[error("unknown message type {0:?}")]
    UnknownType(String),

    #[error("missing required field {0:?}")]
    MissingField(&'static str),

    #[error("field {0:?} has an invalid value")]
    InvalidField(&'static str),
}
