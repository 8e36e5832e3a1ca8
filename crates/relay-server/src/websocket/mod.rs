//! WebSocket connection state, frame decoding, heartbeat, and the per-client
//! session loop.

pub mod connection;
pub mod handler;
pub mod heartbeat;
pub mod session;
