use crate::error::ParseError;
use crate::model::{ConnectionId, Role, RoomId};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Negotiation message types relayed between senders and viewers.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum SignalKind {
    Offer,
    Answer,
    Candidate,
    NeedOffer,
}

impl SignalKind {
    pub fn from_type(ty: &str) -> Option<Self> {
        match ty {
            "offer" => Some(SignalKind::Offer),
            "answer" => Some(SignalKind::Answer),
            "candidate" => Some(SignalKind::Candidate),
            "need-offer" => Some(SignalKind::NeedOffer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Offer => "offer",
            SignalKind::Answer => "answer",
            SignalKind::Candidate => "candidate",
            SignalKind::NeedOffer => "need-offer",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A frame received from a client.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Join {
        room_id: RoomId,
        role: Role,
    },
    /// `fields` is the whole original object, `type` and `to` included, so
    /// it can be relayed verbatim.
    Signal {
        kind: SignalKind,
        to: Option<String>,
        fields: Map<String, Value>,
    },
}

impl ClientMessage {
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Object(fields) = value else {
            return Err(ParseError::NotAnObject);
        };

        let ty = fields
            .get("type")
            .and_then(Value::as_str)
            .ok_or(ParseError::MissingType)?;

        if ty == "join" {
            let room_id = match fields.get("roomId") {
                Some(Value::String(s)) if !s.is_empty() => RoomId::from(s.as_str()),
                None | Some(Value::Null) => return Err(ParseError::MissingField("roomId")),
                Some(_) => return Err(ParseError::InvalidField("roomId")),
            };
            let role = match fields.get("role") {
                None | Some(Value::Null) => return Err(ParseError::MissingField("role")),
                Some(value) => Role::from_wire(value),
            };
            return Ok(ClientMessage::Join { room_id, role });
        }

        let kind = SignalKind::from_type(ty).ok_or_else(|| ParseError::UnknownType(ty.to_string()))?;
        let to = target_of(&fields);

        Ok(ClientMessage::Signal { kind, to, fields })
    }
}

impl FromStr for ClientMessage {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// Empty or falsy `to` means "no target". A non-string target is kept in its
// JSON spelling so it simply never matches a connection id.
fn target_of(fields: &Map<String, Value>) -> Option<String> {
    match fields.get("to")? {
        Value::Null | Value::Bool(false) => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// A frame produced by the relay.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    SenderAvailable,
    SenderGone,
    NeedOffer { from: ConnectionId },
    /// A client's signal, copied field for field with `from` overwritten.
    Relay(Map<String, Value>),
}

impl ServerMessage {
    pub fn relay(fields: &Map<String, Value>, from: ConnectionId) -> Self {
        let mut fields = fields.clone();
        fields.insert("from".to_string(), Value::String(from.to_string()));
        ServerMessage::Relay(fields)
    }

    pub fn to_value(&self) -> Value {
        match self {
            ServerMessage::SenderAvailable => serde_json::json!({ "type": "sender-available" }),
            ServerMessage::SenderGone => serde_json::json!({ "type": "sender-gone" }),
            ServerMessage::NeedOffer { from } => {
                serde_json::json!({ "type": "need-offer", "from": from.to_string() })
            }
            ServerMessage::Relay(fields) => Value::Object(fields.clone()),
        }
    }

    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }
}
