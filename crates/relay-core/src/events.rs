//! Wire events exchanged over the relay socket.
//!
//! Every frame is a JSON object `{"event": <name>, "data": <payload>}`.
//!
//! | Event | Direction | Payload |
//! |---|---|---|
//! | `user_connected` | client→server | display name |
//! | `send_message` | client→server | `{"message", "receiver"}` |
//! | `connected` | server→client | `{"socketId", "timestamp"}` |
//! | `online_users` | server→client | `[{"socketId", "username"}]` |
//! | `receive_message` | server→client | `{"senderId", "message"}` |

use serde::{Deserialize, Serialize};

use crate::errors::{ProtocolError, Result};
use crate::ids::ConnectionId;

/// Events a client may send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Announce presence under a display name.
    UserConnected(String),
    /// Direct message addressed by connection id.
    SendMessage {
        /// Opaque text body.
        message: String,
        /// Target connection id, as last seen in `online_users`.
        receiver: ConnectionId,
    },
}

impl ClientEvent {
    /// Parse and validate one text frame.
    pub fn parse(text: &str) -> Result<Self> {
        let event: Self = serde_json::from_str(text)?;
        if let Self::UserConnected(name) = &event {
            if name.trim().is_empty() {
                return Err(ProtocolError::EmptyDisplayName);
            }
        }
        Ok(event)
    }

    /// Wire name of the event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UserConnected(_) => "user_connected",
            Self::SendMessage { .. } => "send_message",
        }
    }
}

/// One row of the `online_users` broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineUser {
    /// Connection currently registered under `username`.
    pub socket_id: ConnectionId,
    /// Display name.
    pub username: String,
}

/// Events the relay pushes to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// First frame on every connection: the client's own id.
    #[serde(rename_all = "camelCase")]
    Connected {
        /// Id assigned at accept time.
        socket_id: ConnectionId,
        /// RFC 3339 accept time.
        timestamp: String,
    },
    /// Full presence snapshot.
    OnlineUsers(Vec<OnlineUser>),
    /// A direct message from another connection.
    #[serde(rename_all = "camelCase")]
    ReceiveMessage {
        /// Sending connection.
        sender_id: ConnectionId,
        /// Body, unchanged.
        message: String,
    },
}

impl ServerEvent {
    /// `connected` event stamped with the current time.
    pub fn connected(socket_id: ConnectionId) -> Self {
        Self::Connected {
            socket_id,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Wire name of the event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::OnlineUsers(_) => "online_users",
            Self::ReceiveMessage { .. } => "receive_message",
        }
    }

    /// Serialize to a text frame.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
