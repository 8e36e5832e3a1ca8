//! Table of live connections, indexed by connection id.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use relay_core::ConnectionId;

use crate::websocket::connection::ClientConnection;

/// Every accepted connection that has not yet been closed.
#[derive(Default)]
pub struct ConnectionTable {
    connections: RwLock<HashMap<ConnectionId, Arc<ClientConnection>>>,
}

impl ConnectionTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection. An existing entry with the same id is replaced.
    pub fn insert(&self, connection: Arc<ClientConnection>) {
        let _ = self
            .connections
            .write()
            .insert(connection.id.clone(), connection);
    }

    /// Remove a connection by id.
    pub fn remove(&self, id: &ConnectionId) -> Option<Arc<ClientConnection>> {
        self.connections.write().remove(id)
    }

    /// Look up a connection by id.
    pub fn get(&self, id: &ConnectionId) -> Option<Arc<ClientConnection>> {
        self.connections.read().get(id).cloned()
    }

    /// Connections that can still receive frames.
    pub fn deliverable(&self) -> Vec<Arc<ClientConnection>> {
        self.connections
            .read()
            .values()
            .filter(|c| c.is_deliverable())
            .cloned()
            .collect()
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.connections.read().len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }
}
