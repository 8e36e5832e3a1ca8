//! Direct-message routing by connection id.

use metrics::counter;
use relay_core::{ConnectionId, ServerEvent};
use tracing::debug;

use super::connections::ConnectionTable;
use crate::metrics::{RELAY_MESSAGES_DROPPED_TOTAL, RELAY_MESSAGES_ROUTED_TOTAL};

/// Why a message was not delivered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropReason {
    /// No connection with that id exists.
    UnknownTarget,
    /// The target exists but is no longer deliverable.
    TargetClosed,
    /// The target's outbound queue is full.
    QueueFull,
}

impl DropReason {
    /// Label value used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnknownTarget => "unknown_target",
            Self::TargetClosed => "target_closed",
            Self::QueueFull => "queue_full",
        }
    }
}

/// Result of one routing attempt. Never reported back to the sender.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Enqueued on the target's socket.
    Delivered,
    /// Silently discarded.
    Dropped(DropReason),
}

/// Forward `body` from `sender` to `target`.
///
/// Addressing is by connection id only; display names are never consulted.
pub fn route(
    connections: &ConnectionTable,
    sender: &ConnectionId,
    body: String,
    target: &ConnectionId,
) -> RouteOutcome {
    let outcome = match connections.get(target) {
        None => RouteOutcome::Dropped(DropReason::UnknownTarget),
        Some(conn) if !conn.is_deliverable() => RouteOutcome::Dropped(DropReason::TargetClosed),
        Some(conn) => {
            let event = ServerEvent::ReceiveMessage {
                sender_id: sender.clone(),
                message: body,
            };
            if conn.send_event(&event) {
                RouteOutcome::Delivered
            } else {
                RouteOutcome::Dropped(DropReason::QueueFull)
            }
        }
    };

    match outcome {
        RouteOutcome::Delivered => {
            debug!(sender = %sender, target = %target, "message routed");
            counter!(RELAY_MESSAGES_ROUTED_TOTAL).increment(1);
        }
        RouteOutcome::Dropped(reason) => {
            debug!(sender = %sender, target = %target, reason = reason.as_str(), "message dropped");
            counter!(RELAY_MESSAGES_DROPPED_TOTAL, "reason" => reason.as_str()).increment(1);
        }
    }
    outcome
}
