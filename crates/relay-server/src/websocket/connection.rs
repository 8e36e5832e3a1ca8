//! WebSocket client connection state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use axum::extract::ws::Utf8Bytes;
use metrics::counter;
use parking_lot::Mutex;
use relay_core::{ConnectionId, ServerEvent};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::warn;

use crate::metrics::WS_SEND_QUEUE_DROPS_TOTAL;

/// Lifecycle of one connection.
///
/// `Connecting → Open → Registered → Closed`, with `Open → Closed` for
/// clients that leave before registering. `Closed` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// Transport accepted, id not yet published.
    Connecting,
    /// Reachable by id, not listed as present.
    Open,
    /// Has sent at least one `user_connected`.
    Registered,
    /// Torn down; no further events are accepted.
    Closed,
}

impl ConnectionState {
    /// Whether frames may still be delivered to this connection.
    pub fn is_deliverable(self) -> bool {
        matches!(self, Self::Open | Self::Registered)
    }
}

/// Frame queued for the socket writer task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outbound {
    /// Serialized server event, shared across broadcast recipients.
    Text(Utf8Bytes),
    /// Heartbeat ping.
    Ping,
    /// Close the socket with the given code and reason; nothing is written
    /// after it.
    Close {
        /// WebSocket close code.
        code: u16,
        /// Human-readable reason.
        reason: &'static str,
    },
}

/// Represents a connected WebSocket client.
pub struct ClientConnection {
    /// Unique connection ID.
    pub id: ConnectionId,
    state: Mutex<ConnectionState>,
    /// Send channel to the client's WebSocket write task.
    tx: mpsc::Sender<Outbound>,
    /// When this connection was established.
    pub connected_at: Instant,
    last_pong: Mutex<Instant>,
    /// Count of frames dropped due to a full or closed channel.
    pub dropped_messages: AtomicU64,
}

impl ClientConnection {
    /// Create a new connection in the `Connecting` state.
    pub fn new(id: ConnectionId, tx: mpsc::Sender<Outbound>) -> Self {
        let now = Instant::now();
        Self {
            id,
            state: Mutex::new(ConnectionState::Connecting),
            tx,
            connected_at: now,
            last_pong: Mutex::new(now),
            dropped_messages: AtomicU64::new(0),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// `Connecting → Open`. Returns `false` from any other state.
    pub fn mark_open(&self) -> bool {
        let mut state = self.state.lock();
        if *state == ConnectionState::Connecting {
            *state = ConnectionState::Open;
            true
        } else {
            false
        }
    }

    /// `Open | Registered → Registered`. Returns `false` once closed.
    pub fn mark_registered(&self) -> bool {
        let mut state = self.state.lock();
        if state.is_deliverable() {
            *state = ConnectionState::Registered;
            true
        } else {
            false
        }
    }

    /// Move to `Closed`. Returns `true` only for the call that performed the
    /// transition.
    pub fn mark_closed(&self) -> bool {
        let mut state = self.state.lock();
        if *state == ConnectionState::Closed {
            false
        } else {
            *state = ConnectionState::Closed;
            true
        }
    }

    /// Whether frames may still be delivered.
    pub fn is_deliverable(&self) -> bool {
        self.state().is_deliverable()
    }

    /// Queue a serialized frame for the client.
    ///
    /// Returns `false` if the channel is full or closed, and increments
    /// the dropped message counter.
    pub fn send(&self, text: Utf8Bytes) -> bool {
        self.enqueue(Outbound::Text(text))
    }

    /// Serialize a server event and queue it.
    pub fn send_event(&self, event: &ServerEvent) -> bool {
        match event.to_json() {
            Ok(json) => self.send(json.into()),
            Err(e) => {
                warn!(conn_id = %self.id, event = event.name(), error = %e, "failed to serialize event");
                false
            }
        }
    }

    /// Queue a ping frame.
    pub fn ping(&self) -> bool {
        self.enqueue(Outbound::Ping)
    }

    /// Queue a close frame. The writer stops after sending it.
    pub fn close(&self, code: u16, reason: &'static str) -> bool {
        self.enqueue(Outbound::Close { code, reason })
    }

    fn enqueue(&self, frame: Outbound) -> bool {
        if self.tx.try_send(frame).is_ok() {
            true
        } else {
            let _ = self.dropped_messages.fetch_add(1, Ordering::Relaxed);
            counter!(WS_SEND_QUEUE_DROPS_TOTAL).increment(1);
            false
        }
    }

    /// Total frames dropped for this connection.
    pub fn drop_count(&self) -> u64 {
        self.dropped_messages.load(Ordering::Relaxed)
    }

    /// Record client activity (pong or any other inbound frame).
    pub fn mark_alive(&self) {
        *self.last_pong.lock() = Instant::now();
    }

    /// When the client was last heard from.
    pub fn last_pong(&self) -> Instant {
        *self.last_pong.lock()
    }

    /// Duration since the last pong (or connection establishment).
    pub fn last_pong_elapsed(&self) -> Duration {
        self.last_pong.lock().elapsed()
    }

    /// Connection age.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_connection() -> (ClientConnection, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(32);
        let conn = ClientConnection::new("conn_1".into(), tx);
        (conn, rx)
    }

    #[test]
    fn create_connection() {
        let (conn, _rx) = make_connection();
        assert_eq!(conn.id.as_str(), "conn_1");
        assert_eq!(conn.state(), ConnectionState::Connecting);
        assert!(!conn.is_deliverable());
    }

    #[test]
    fn lifecycle_open_registered_closed() {
        let (conn, _rx) = make_connection();
        assert!(conn.mark_open());
        assert_eq!(conn.state(), ConnectionState::Open);
        assert!(conn.mark_registered());
        assert!(conn.mark_registered());
        assert_eq!(conn.state(), ConnectionState::Registered);
        assert!(conn.mark_closed());
        assert_eq!(conn.state(), ConnectionState::Closed);
    }

    #[test]
    fn open_straight_to_closed() {
        let (conn, _rx) = make_connection();
        assert!(conn.mark_open());
        assert!(conn.mark_closed());
        assert!(!conn.is_deliverable());
    }

    #[test]
    fn closed_is_terminal() {
        let (conn, _rx) = make_connection();
        let _ = conn.mark_open();
        assert!(conn.mark_closed());
        assert!(!conn.mark_closed());
        assert!(!conn.mark_registered());
        assert!(!conn.mark_open());
        assert_eq!(conn.state(), ConnectionState::Closed);
    }

    #[test]
    fn cannot_register_before_open() {
        let (conn, _rx) = make_connection();
        assert!(!conn.mark_registered());
    }

    #[tokio::test]
    async fn send_message_success() {
        let (conn, mut rx) = make_connection();
        assert!(conn.send("hello".into()));
        let msg = rx.recv().await.unwrap();
        assert_eq!(msg, Outbound::Text("hello".into()));
    }

    #[tokio::test]
    async fn send_to_closed_channel_returns_false() {
        let (tx, rx) = mpsc::channel(32);
        let conn = ClientConnection::new("conn_2".into(), tx);
        drop(rx);
        assert!(!conn.send("hello".into()));
        assert_eq!(conn.drop_count(), 1);
    }

    #[tokio::test]
    async fn send_to_full_channel_returns_false() {
        let (tx, _rx) = mpsc::channel(1);
        let conn = ClientConnection::new("conn_3".into(), tx);
        assert!(conn.send("msg1".into()));
        assert!(!conn.send("msg2".into()));
        assert!(!conn.ping());
        assert_eq!(conn.drop_count(), 2);
    }

    #[tokio::test]
    async fn send_event_serializes() {
        let (conn, mut rx) = make_connection();
        assert!(conn.send_event(&ServerEvent::connected(conn.id.clone())));
        let Outbound::Text(text) = rx.recv().await.unwrap() else {
            panic!("expected text frame");
        };
        let parsed: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();
        assert_eq!(parsed["event"], "connected");
        assert_eq!(parsed["data"]["socketId"], "conn_1");
    }

    #[tokio::test]
    async fn close_and_ping_frames_are_queued_in_order() {
        let (conn, mut rx) = make_connection();
        assert!(conn.ping());
        assert!(conn.close(1008, "malformed event"));
        assert_eq!(rx.recv().await.unwrap(), Outbound::Ping);
        assert_eq!(
            rx.recv().await.unwrap(),
            Outbound::Close {
                code: 1008,
                reason: "malformed event"
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn mark_alive_resets_silence() {
        let (conn, _rx) = make_connection();
        tokio::time::advance(Duration::from_secs(40)).await;
        assert_eq!(conn.last_pong_elapsed(), Duration::from_secs(40));
        conn.mark_alive();
        assert_eq!(conn.last_pong_elapsed(), Duration::ZERO);
        assert_eq!(conn.last_pong(), Instant::now());
    }

    #[test]
    fn connection_age_increases() {
        let (conn, _rx) = make_connection();
        let age1 = conn.age();
        std::thread::sleep(Duration::from_millis(10));
        assert!(conn.age() > age1);
        assert!(conn.last_pong_elapsed() >= Duration::from_millis(10));
    }
}
