//! # beacon-core
//!
//! Shared foundation for the Beacon development server:
//!
//! - Configuration schemas (server, live-reload, client, logging)
//! - The unified [`error::AppError`] type used across all crates
//! - The [`result::AppResult`] alias

pub mod config;
pub mod error;
pub mod result;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
