//! Presence snapshot fan-out.

use axum::extract::ws::Utf8Bytes;
use metrics::counter;
use relay_core::{OnlineUser, ServerEvent};
use tracing::{debug, warn};

use super::connections::ConnectionTable;
use super::presence::PresenceEntry;
use crate::metrics::RELAY_BROADCASTS_TOTAL;

/// Push `snapshot` as one `online_users` event to every deliverable
/// connection, including the one whose action triggered it.
///
/// The frame is serialized once and shared. Enqueueing never blocks, so
/// this is safe to call while the registry lock is held. Returns the number
/// of connections the frame was enqueued on.
pub fn broadcast_snapshot(connections: &ConnectionTable, snapshot: Vec<PresenceEntry>) -> usize {
    let users: Vec<OnlineUser> = snapshot.into_iter().map(OnlineUser::from).collect();
    let online = users.len();
    let event = ServerEvent::OnlineUsers(users);
    let json: Utf8Bytes = match event.to_json() {
        Ok(json) => json.into(),
        Err(e) => {
            warn!(event = event.name(), error = %e, "failed to serialize event");
            return 0;
        }
    };

    let targets = connections.deliverable();
    let mut delivered = 0;
    for conn in &targets {
        if conn.send(json.clone()) {
            delivered += 1;
        } else {
            warn!(conn_id = %conn.id, "failed to enqueue online_users");
        }
    }
    debug!(online, recipients = targets.len(), delivered, "broadcast online_users");
    counter!(RELAY_BROADCASTS_TOTAL).increment(1);
    delivered
}
