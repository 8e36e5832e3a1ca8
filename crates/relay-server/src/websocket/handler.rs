//! Inbound frame decoding: turns one transport frame into an action for the
//! session loop.

use axum::extract::ws::Message;
use relay_core::{ClientEvent, ProtocolError};
use tracing::debug;

/// What the session should do with one inbound frame.
#[derive(Debug)]
pub enum FrameAction {
    /// A valid client event.
    Event(ClientEvent),
    /// A schema violation; the connection must be closed with 1008.
    Violation(ProtocolError),
    /// Ping or pong: proof of liveness, nothing else to do.
    Liveness,
    /// The client sent a close frame.
    Closed,
}

/// Decode one frame. Binary frames carrying UTF-8 JSON are treated like
/// text frames.
pub fn decode_frame(message: &Message) -> FrameAction {
    let text = match message {
        Message::Text(text) => text.as_str(),
        Message::Binary(data) => match std::str::from_utf8(data) {
            Ok(text) => text,
            Err(_) => {
                debug!(len = data.len(), "received non-UTF8 binary frame");
                return FrameAction::Violation(ProtocolError::NonUtf8Frame);
            }
        },
        Message::Ping(_) | Message::Pong(_) => return FrameAction::Liveness,
        Message::Close(_) => return FrameAction::Closed,
    };

    match ClientEvent::parse(text) {
        Ok(event) => FrameAction::Event(event),
        Err(e) => FrameAction::Violation(e),
    }
}
