//! # beacon-api
//!
//! HTTP layer for the Beacon development server: the axum router, the
//! WebSocket and SockJS transport endpoints, host/origin validation, and
//! the diagnostics surface.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
