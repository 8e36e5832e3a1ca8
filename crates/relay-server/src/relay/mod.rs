//! The relay: connection table, presence registry, router and notifier.
//!
//! [`Relay`] owns all shared state. Registry mutations and the broadcast
//! they trigger happen under one lock, so every client observes snapshots
//! in mutation order.

pub mod connections;
pub mod notifier;
pub mod presence;
pub mod router;

use std::sync::Arc;

use metrics::gauge;
use parking_lot::Mutex;
use relay_core::{ClientEvent, ConnectionId, ServerEvent};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::metrics::RELAY_ONLINE_USERS;
use crate::websocket::connection::{ClientConnection, Outbound};

use connections::ConnectionTable;
use notifier::broadcast_snapshot;
use presence::{PresenceEntry, PresenceRegistry};
use router::{RouteOutcome, route};

/// Shared relay state, one per server.
pub struct Relay {
    connections: ConnectionTable,
    presence: Mutex<PresenceRegistry>,
    send_queue_capacity: usize,
}

impl Relay {
    /// Create an empty relay whose connections buffer up to
    /// `send_queue_capacity` outbound frames each.
    pub fn new(send_queue_capacity: usize) -> Self {
        Self {
            connections: ConnectionTable::new(),
            presence: Mutex::new(PresenceRegistry::new()),
            send_queue_capacity: send_queue_capacity.max(1),
        }
    }

    /// Admit a new connection.
    ///
    /// Assigns a fresh id, queues the `connected` event as the first frame,
    /// and makes the connection addressable. Returns the connection and the
    /// receiving end of its outbound queue.
    pub fn accept(&self) -> (Arc<ClientConnection>, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(self.send_queue_capacity);
        let connection = Arc::new(ClientConnection::new(ConnectionId::new(), tx));
        let _ = connection.send_event(&ServerEvent::connected(connection.id.clone()));
        let _ = connection.mark_open();
        self.connections.insert(connection.clone());
        debug!(conn_id = %connection.id, "connection accepted");
        (connection, rx)
    }

    /// Apply one client event on behalf of `id`.
    pub fn handle(&self, id: &ConnectionId, event: ClientEvent) {
        match event {
            ClientEvent::UserConnected(name) => {
                let _ = self.register(id, &name);
            }
            ClientEvent::SendMessage { message, receiver } => {
                let _ = self.send_message(id, message, &receiver);
            }
        }
    }

    /// Register `id` under `name` and broadcast the new snapshot.
    ///
    /// Returns `false` if the connection is unknown or already closed; in
    /// that case nothing changes and nothing is broadcast.
    pub fn register(&self, id: &ConnectionId, name: &str) -> bool {
        let Some(connection) = self.connections.get(id) else {
            return false;
        };

        let mut presence = self.presence.lock();
        if !connection.mark_registered() {
            return false;
        }
        let displaced = presence.register(name, id.clone());
        let snapshot = presence.snapshot();
        let online = snapshot.len();
        let _ = broadcast_snapshot(&self.connections, snapshot);
        drop(presence);

        set_online_gauge(online);
        match displaced {
            Some(previous) => {
                info!(conn_id = %id, username = name, displaced = %previous, "user re-registered");
            }
            None => info!(conn_id = %id, username = name, "user registered"),
        }
        true
    }

    /// Route a direct message from `sender` to `receiver`.
    pub fn send_message(
        &self,
        sender: &ConnectionId,
        message: String,
        receiver: &ConnectionId,
    ) -> RouteOutcome {
        route(&self.connections, sender, message, receiver)
    }

    /// Tear down `id`: remove it from the table, free its name, and
    /// broadcast the updated snapshot.
    ///
    /// Runs at most once per connection; later calls return `false`.
    pub fn close(&self, id: &ConnectionId) -> bool {
        let Some(connection) = self.connections.remove(id) else {
            return false;
        };
        if !connection.mark_closed() {
            return false;
        }

        let mut presence = self.presence.lock();
        let freed = presence.unregister(id);
        let snapshot = presence.snapshot();
        let online = snapshot.len();
        let _ = broadcast_snapshot(&self.connections, snapshot);
        drop(presence);

        set_online_gauge(online);
        match freed {
            Some(name) => info!(conn_id = %id, username = %name, "user left"),
            None => debug!(conn_id = %id, "unregistered connection closed"),
        }
        true
    }

    /// Current presence snapshot.
    pub fn snapshot(&self) -> Vec<PresenceEntry> {
        self.presence.lock().snapshot()
    }

    /// Look up a live connection.
    pub fn connection(&self, id: &ConnectionId) -> Option<Arc<ClientConnection>> {
        self.connections.get(id)
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Number of names online.
    pub fn online_count(&self) -> usize {
        self.presence.lock().len()
    }
}

#[allow(clippy::cast_precision_loss)]
fn set_online_gauge(online: usize) {
    gauge!(RELAY_ONLINE_USERS).set(online as f64);
}
