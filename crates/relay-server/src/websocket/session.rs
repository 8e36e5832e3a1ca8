//! WebSocket session lifecycle: handles a single connected client from
//! upgrade through disconnect.

use std::future::{Future, pending};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket, close_code};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge, histogram};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Span, debug, field, info, instrument, warn};

use super::connection::Outbound;
use super::handler::{FrameAction, decode_frame};
use super::heartbeat::{HeartbeatResult, run_heartbeat};
use crate::config::HeartbeatConfig;
use crate::metrics::{
    WS_CONNECTION_DURATION_SECONDS, WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL,
    WS_DISCONNECTIONS_TOTAL, WS_PROTOCOL_VIOLATIONS_TOTAL,
};
use crate::relay::Relay;

/// How long the writer may take to flush after the session ends.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Close reason sent when the server is stopping.
const SHUTDOWN_REASON: &str = "server shutting down";

/// Close reason sent when the heartbeat gives up.
const HEARTBEAT_REASON: &str = "heartbeat timeout";

/// Why a session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    /// Close frame or end of stream from the client.
    ClientClosed,
    /// The transport reported an error.
    TransportError,
    /// The client sent a frame that does not match the wire schema.
    ProtocolViolation,
    /// No liveness signal within the heartbeat timeout.
    HeartbeatTimeout,
    /// The server is shutting down.
    Shutdown,
}

impl SessionEnd {
    /// Label value used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ClientClosed => "client_closed",
            Self::TransportError => "transport_error",
            Self::ProtocolViolation => "protocol_violation",
            Self::HeartbeatTimeout => "heartbeat_timeout",
            Self::Shutdown => "shutdown",
        }
    }
}

/// Run a WebSocket session for a connected client.
///
/// 1. Admits the connection to the relay, which queues the `connected` event
/// 2. Spawns the writer that drains the outbound queue onto the socket
/// 3. Decodes inbound frames and applies them in order
/// 4. Runs the heartbeat, if enabled
/// 5. On any exit path, closes the connection in the relay exactly once
#[instrument(skip_all, fields(conn_id = field::Empty))]
pub async fn run_ws_session(
    ws: WebSocket,
    relay: Arc<Relay>,
    heartbeat: Option<HeartbeatConfig>,
    shutdown: CancellationToken,
) -> SessionEnd {
    let (connection, outbound_rx) = relay.accept();
    let conn_id = connection.id.clone();
    let _ = Span::current().record("conn_id", conn_id.as_str());

    info!("client connected");
    counter!(WS_CONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).increment(1.0);

    let (ws_tx, mut ws_rx) = ws.split();
    let mut writer = tokio::spawn(write_loop(ws_tx, outbound_rx));

    let mut liveness: Pin<Box<dyn Future<Output = HeartbeatResult> + Send>> = match heartbeat {
        Some(hb) => Box::pin(run_heartbeat(
            connection.clone(),
            hb.interval,
            hb.timeout,
            shutdown.child_token(),
        )),
        None => Box::pin(pending::<HeartbeatResult>()),
    };

    let end = loop {
        tokio::select! {
            frame = ws_rx.next() => {
                let msg = match frame {
                    None => break SessionEnd::ClientClosed,
                    Some(Err(e)) => {
                        debug!(error = %e, "transport error");
                        break SessionEnd::TransportError;
                    }
                    Some(Ok(msg)) => msg,
                };
                connection.mark_alive();
                match decode_frame(&msg) {
                    FrameAction::Event(event) => {
                        debug!(event = event.name(), "event received");
                        relay.handle(&conn_id, event);
                    }
                    FrameAction::Liveness => {}
                    FrameAction::Closed => break SessionEnd::ClientClosed,
                    FrameAction::Violation(e) => {
                        warn!(error = %e, "protocol violation, closing");
                        counter!(WS_PROTOCOL_VIOLATIONS_TOTAL, "reason" => e.close_reason()).increment(1);
                        let _ = connection.close(close_code::POLICY, e.close_reason());
                        break SessionEnd::ProtocolViolation;
                    }
                }
            }
            result = &mut liveness => {
                match result {
                    HeartbeatResult::TimedOut => {
                        warn!(
                            silent_for = ?connection.last_pong_elapsed(),
                            "client unresponsive, disconnecting"
                        );
                        let _ = connection.close(close_code::AWAY, HEARTBEAT_REASON);
                        break SessionEnd::HeartbeatTimeout;
                    }
                    HeartbeatResult::Cancelled => {
                        let _ = connection.close(close_code::AWAY, SHUTDOWN_REASON);
                        break SessionEnd::Shutdown;
                    }
                }
            }
            () = shutdown.cancelled() => {
                let _ = connection.close(close_code::AWAY, SHUTDOWN_REASON);
                break SessionEnd::Shutdown;
            }
        }
    };

    drop(liveness);
    let _ = relay.close(&conn_id);

    let dropped = connection.drop_count();
    let duration = connection.age();
    drop(connection);

    if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer)
        .await
        .is_err()
    {
        debug!("writer did not drain in time, aborting");
        writer.abort();
    }

    info!(reason = end.as_str(), dropped, "client disconnected");
    counter!(WS_DISCONNECTIONS_TOTAL, "reason" => end.as_str()).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).decrement(1.0);
    histogram!(WS_CONNECTION_DURATION_SECONDS).record(duration.as_secs_f64());
    end
}

/// Drain the outbound queue onto the socket.
///
/// Stops after writing a close frame, on a write error, or when every
/// sender is gone.
async fn write_loop(
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<Outbound>,
) {
    while let Some(frame) = outbound.recv().await {
        let (message, last) = to_message(frame);
        if ws_tx.send(message).await.is_err() {
            return;
        }
        if last {
            break;
        }
    }
    let _ = ws_tx.close().await;
}

fn to_message(frame: Outbound) -> (Message, bool) {
    match frame {
        Outbound::Text(text) => (Message::Text(text), false),
        Outbound::Ping => (Message::Ping(Vec::new().into()), false),
        Outbound::Close { code, reason } => (
            Message::Close(Some(CloseFrame {
                code,
                reason: String::from(reason).into(),
            })),
            true,
        ),
    }
}
