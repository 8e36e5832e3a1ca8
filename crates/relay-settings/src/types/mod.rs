//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]`, so a settings
//! file may contain any subset of fields.

mod cors;
mod server;

pub use cors::*;
pub use server::*;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type for the relay.
///
/// ```json
/// {
///   "server": { "port": 4000, "heartbeatIntervalSecs": 15 },
///   "cors": { "allowedOrigins": ["https://console.example.com"] },
///   "logging": { "level": "debug", "format": "json" }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelaySettings {
    /// Listener and connection limits.
    pub server: ServerSettings,
    /// Cross-origin policy for HTTP routes and the WebSocket upgrade.
    pub cors: CorsSettings,
    /// Log level and format.
    pub logging: LoggingSettings,
}

impl RelaySettings {
    /// Reject combinations the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        let server = &self.server;
        if server.max_connections == 0 {
            return Err(SettingsError::InvalidValue(
                "server.maxConnections must be at least 1".into(),
            ));
        }
        if server.send_queue_capacity == 0 {
            return Err(SettingsError::InvalidValue(
                "server.sendQueueCapacity must be at least 1".into(),
            ));
        }
        if server.max_message_size == 0 {
            return Err(SettingsError::InvalidValue(
                "server.maxMessageSize must be at least 1".into(),
            ));
        }
        if server.heartbeat_interval_secs > 0
            && server.heartbeat_timeout_secs < server.heartbeat_interval_secs
        {
            return Err(SettingsError::InvalidValue(format!(
                "server.heartbeatTimeoutSecs ({}) is shorter than server.heartbeatIntervalSecs ({})",
                server.heartbeat_timeout_secs, server.heartbeat_interval_secs
            )));
        }
        if self.cors.allows_any_origin() && self.cors.allow_credentials {
            return Err(SettingsError::InvalidValue(
                "cors.allowCredentials cannot be combined with a \"*\" origin".into(),
            ));
        }
        Ok(())
    }
}
