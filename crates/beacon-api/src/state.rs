//! Shared application state threaded through every handler.

use std::sync::Arc;

use beacon_core::config::AppConfig;
use beacon_livereload::LiveReloadEngine;

/// State available to all handlers via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Full application configuration.
    pub config: Arc<AppConfig>,
    /// The live-reload engine.
    pub engine: Arc<LiveReloadEngine>,
}
