//! Health and diagnostics endpoints.

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use crate::state::AppState;

/// GET /beacon/health — liveness probe plus the open connection count.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "connections": state.engine.connection_count(),
    }))
}
