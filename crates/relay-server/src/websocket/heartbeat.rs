//! Heartbeat ping/pong liveness monitoring.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::connection::ClientConnection;

/// Outcome of the heartbeat loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatResult {
    /// The client stopped responding within the timeout window.
    TimedOut,
    /// The heartbeat was cancelled externally.
    Cancelled,
}

/// Run heartbeat pings for a connection.
///
/// A ping is queued every `interval`. Any inbound frame counts as a pong.
/// Once the client has been silent for `timeout`, `HeartbeatResult::TimedOut`
/// is returned, independent of where that falls between pings.
pub async fn run_heartbeat(
    connection: Arc<ClientConnection>,
    interval: Duration,
    timeout: Duration,
    cancel: CancellationToken,
) -> HeartbeatResult {
    let mut next_ping = Instant::now() + interval;

    loop {
        let deadline = connection.last_pong() + timeout;
        tokio::select! {
            () = time::sleep_until(next_ping.min(deadline)) => {
                let silent_for = connection.last_pong_elapsed();
                if silent_for >= timeout {
                    debug!(conn_id = %connection.id, ?silent_for, "heartbeat timed out");
                    return HeartbeatResult::TimedOut;
                }
                let now = Instant::now();
                if now >= next_ping {
                    let _ = connection.ping();
                    next_ping = now + interval;
                }
            }
            () = cancel.cancelled() => {
                return HeartbeatResult::Cancelled;
            }
        }
    }
}
