//! # relay-server
//!
//! Axum HTTP + `WebSocket` presence relay.
//!
//! - `WebSocket` gateway at `/ws`: origin check, connection ids, heartbeat
//! - Presence registry: display name → connection id, last registration wins
//! - Direct-message router: fire-and-forget delivery by connection id
//! - Broadcast notifier: full `online_users` snapshot on every registry change
//! - HTTP endpoints: `/health`, `/metrics`
//! - Graceful shutdown via `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod cors;
pub mod error;
pub mod health;
pub mod metrics;
pub mod relay;
pub mod server;
pub mod shutdown;
pub mod websocket;

pub use config::{HeartbeatConfig, ServerConfig};
pub use error::ServerError;
pub use relay::Relay;
pub use server::RelayServer;
