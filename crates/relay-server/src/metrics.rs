//! Prometheus metrics recorder and `/metrics` endpoint handler.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

use crate::error::Result;

/// Install the Prometheus metrics recorder (global).
///
/// Returns the `PrometheusHandle` used to render the `/metrics` endpoint.
/// Must be called once at startup before any metrics are recorded.
pub fn install_recorder() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    info!("prometheus metrics recorder installed");
    Ok(handle)
}

/// Render Prometheus text format from the installed recorder.
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}

/// WebSocket connections opened total (counter).
pub const WS_CONNECTIONS_TOTAL: &str = "ws_connections_total";
/// WebSocket disconnections total (counter, labels: reason).
pub const WS_DISCONNECTIONS_TOTAL: &str = "ws_disconnections_total";
/// Active WebSocket connections (gauge).
pub const WS_CONNECTIONS_ACTIVE: &str = "ws_connections_active";
/// Connection lifetime seconds (histogram).
pub const WS_CONNECTION_DURATION_SECONDS: &str = "ws_connection_duration_seconds";
/// Frames rejected by schema validation (counter, labels: reason).
pub const WS_PROTOCOL_VIOLATIONS_TOTAL: &str = "ws_protocol_violations_total";
/// Outbound frames dropped on a full or closed queue (counter).
pub const WS_SEND_QUEUE_DROPS_TOTAL: &str = "ws_send_queue_drops_total";
/// Upgrades refused (counter, labels: reason).
pub const WS_REJECTED_TOTAL: &str = "ws_rejected_total";
/// Names currently present (gauge).
pub const RELAY_ONLINE_USERS: &str = "relay_online_users";
/// `online_users` broadcasts total (counter).
pub const RELAY_BROADCASTS_TOTAL: &str = "relay_broadcasts_total";
/// Direct messages delivered total (counter).
pub const RELAY_MESSAGES_ROUTED_TOTAL: &str = "relay_messages_routed_total";
/// Direct messages dropped total (counter, labels: reason).
pub const RELAY_MESSAGES_DROPPED_TOTAL: &str = "relay_messages_dropped_total";
