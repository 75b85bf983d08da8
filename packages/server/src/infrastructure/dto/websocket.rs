//! WebSocket message DTOs.
//!
//! Server-originated messages are typed structs. Client messages other than
//! `join` stay as raw text so they can be relayed byte-for-byte; only the
//! routing fields are read from them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `type` of messages the server itself emits.
///
/// Inbound types are matched as plain strings since unknown ones must still
/// be relayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageType {
    UserList,
    NewUser,
    Leave,
}

/// First message on every connection.
///
/// `name` and `room` default to empty so that a missing field is reported as
/// an invalid value rather than a parse error.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JoinMessage {
    pub r#type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub room: String,
}

/// Sent once to a client right after admission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserListMessage {
    pub r#type: MessageType,
    pub users: Vec<String>,
}

impl UserListMessage {
    pub fn new(users: Vec<String>) -> Self {
        Self {
            r#type: MessageType::UserList,
            users,
        }
    }
}

/// Broadcast to the room when a client is admitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewUserMessage {
    pub r#type: MessageType,
    pub name: String,
}

impl NewUserMessage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            r#type: MessageType::NewUser,
            name: name.into(),
        }
    }
}

/// Broadcast to the room when a client is removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaveMessage {
    pub r#type: MessageType,
    pub name: String,
}

impl LeaveMessage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            r#type: MessageType::Leave,
            name: name.into(),
        }
    }
}

/// Routing fields of an inbound steady-state message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundEnvelope {
    /// `type`, when present and a string.
    pub kind: Option<String>,
    /// `target`, when present, a string and non-empty.
    pub target: Option<String>,
}

impl InboundEnvelope {
    /// Parse `raw` as a JSON object and pull out the routing fields.
    ///
    /// Anything that is not a JSON object is an error. Non-string `type` or
    /// `target` values are treated as absent.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        let object: Map<String, Value> = serde_json::from_str(raw)?;
        let field = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        Ok(Self {
            kind: field("type"),
            target: field("target").filter(|target| !target.is_empty()),
        })
    }
}
