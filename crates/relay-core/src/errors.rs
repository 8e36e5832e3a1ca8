//! Protocol error types.

use thiserror::Error;

/// A frame received from a client that does not match the wire schema.
///
/// Every variant is fatal for the connection that sent it: the gateway closes
/// the socket with a policy-violation close frame carrying
/// [`ProtocolError::close_reason`].
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Not JSON, unknown event name, missing field, or wrong field type.
    #[error("malformed event: {0}")]
    Malformed(#[from] serde_json::Error),
    /// `user_connected` with an empty or whitespace-only display name.
    #[error("display name must not be empty")]
    EmptyDisplayName,
    /// Binary frame whose payload is not valid UTF-8.
    #[error("binary frame is not valid UTF-8")]
    NonUtf8Frame,
}

impl ProtocolError {
    /// Short reason suitable for a WebSocket close frame (well under the
    /// 123-byte limit).
    pub fn close_reason(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "malformed event",
            Self::EmptyDisplayName => "empty display name",
            Self::NonUtf8Frame => "non-utf8 frame",
        }
    }
}

/// Result type for protocol parsing.
pub type Result<T> = std::result::Result<T, ProtocolError>;
