//! Build-event intake.
//!
//! The compiler is an external collaborator. An embedded pipeline feeds
//! `StatusSource::handle_event` directly; an out-of-process pipeline posts
//! the same events here as JSON.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::debug;

use beacon_build::events::CompilerEvent;

use crate::state::AppState;

/// POST /beacon/build-event — feed one compiler event into the engine.
pub async fn ingest_event(
    State(state): State<AppState>,
    Json(event): Json<CompilerEvent>,
) -> StatusCode {
    debug!(event = ?event, "build event received");
    state.engine.status_source().handle_event(event);
    StatusCode::ACCEPTED
}
