//! Presence registry: display name → current connection id.

use std::collections::HashMap;

use indexmap::IndexMap;
use relay_core::{ConnectionId, OnlineUser};

/// One row of a presence snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PresenceEntry {
    /// Display name.
    pub name: String,
    /// Connection currently holding the name.
    pub connection_id: ConnectionId,
}

impl From<PresenceEntry> for OnlineUser {
    fn from(entry: PresenceEntry) -> Self {
        Self {
            socket_id: entry.connection_id,
            username: entry.name,
        }
    }
}

/// In-memory presence table.
///
/// At most one entry per name and at most one entry per connection.
/// Iteration follows insertion order; re-registering a name keeps its slot.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    by_name: IndexMap<String, ConnectionId>,
    by_connection: HashMap<ConnectionId, String>,
}

impl PresenceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert `name → connection_id`.
    ///
    /// Returns the connection that previously held `name`, if it was a
    /// different one. The displaced connection stays open; it is simply no
    /// longer listed. If `connection_id` was registered under another name,
    /// that entry is removed.
    pub fn register(&mut self, name: &str, connection_id: ConnectionId) -> Option<ConnectionId> {
        if let Some(previous_name) = self.by_connection.get(&connection_id) {
            if previous_name != name {
                let _ = self.by_name.shift_remove(previous_name.as_str());
            }
        }

        let displaced = self
            .by_name
            .insert(name.to_string(), connection_id.clone())
            .filter(|old| *old != connection_id);
        if let Some(old) = &displaced {
            let _ = self.by_connection.remove(old);
        }
        let _ = self.by_connection.insert(connection_id, name.to_string());
        displaced
    }

    /// Remove the entry pointing at `connection_id`.
    ///
    /// Returns the name that was freed, or `None` if nothing matched.
    pub fn unregister(&mut self, connection_id: &ConnectionId) -> Option<String> {
        let name = self.by_connection.remove(connection_id)?;
        let _ = self.by_name.shift_remove(name.as_str());
        Some(name)
    }

    /// Connection currently registered under `name`.
    #[cfg(test)]
    pub fn lookup(&self, name: &str) -> Option<&ConnectionId> {
        self.by_name.get(name)
    }

    /// Name currently held by `connection_id`.
    #[cfg(test)]
    pub fn name_of(&self, connection_id: &ConnectionId) -> Option<&str> {
        self.by_connection.get(connection_id).map(String::as_str)
    }

    /// Ordered copy of all entries.
    pub fn snapshot(&self) -> Vec<PresenceEntry> {
        self.by_name
            .iter()
            .map(|(name, id)| PresenceEntry {
                name: name.clone(),
                connection_id: id.clone(),
            })
            .collect()
    }

    /// Number of names online.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether nobody is online.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
