//! # relay-core
//!
//! Shared vocabulary of the presence relay.
//!
//! - [`ids::ConnectionId`]: opaque, process-unique connection identifier
//! - [`events`]: typed client→server and server→client wire events
//! - [`errors::ProtocolError`]: schema violations detected at the gateway
//! - [`logging`]: `tracing` subscriber setup shared by the binary and tests

#![deny(unsafe_code)]

pub mod errors;
pub mod events;
pub mod ids;
pub mod logging;

pub use errors::ProtocolError;
pub use events::{ClientEvent, OnlineUser, ServerEvent};
pub use ids::ConnectionId;
