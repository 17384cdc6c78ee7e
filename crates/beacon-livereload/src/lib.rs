//! # beacon-livereload
//!
//! The build-status broadcast engine. Provides:
//!
//! - The wire protocol (`type`/`data` JSON messages) and its codec
//! - Transport normalization for native WebSocket and SockJS fallback
//! - The connection registry with snapshot-based broadcast
//! - Per-connection heartbeat/liveness monitoring
//! - The broadcast controller (status → messages, bootstrap unicast)
//! - The reconnect/backoff contract observed by the browser client

pub mod broadcast;
pub mod client;
pub mod connection;
pub mod message;
pub mod server;
pub mod transport;

pub use broadcast::BroadcastController;
pub use connection::handle::{ConnectionHandle, ConnectionId};
pub use connection::registry::ConnectionRegistry;
pub use message::types::WireMessage;
pub use server::LiveReloadEngine;
pub use transport::{Frame, TransportKind};
