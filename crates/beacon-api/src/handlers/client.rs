//! Client runtime configuration endpoint.
//!
//! The bundler fetches this at build time and embeds it into the client
//! entry, so the browser knows which endpoint to dial and how to back off.

use axum::Json;
use axum::extract::State;

use beacon_core::config::livereload::TransportMode;
use beacon_livereload::client::ClientRuntimeConfig;

use crate::state::AppState;

/// GET /beacon/client-config — the resolved client contract.
pub async fn client_config(State(state): State<AppState>) -> Json<ClientRuntimeConfig> {
    let server = &state.config.server;
    let live_reload = &state.config.live_reload;

    // SockJS-only mode hands the client the SockJS prefix; anything else
    // prefers the native WebSocket path.
    let (transport, path) = if live_reload.transport == TransportMode::Sockjs {
        (TransportMode::Sockjs, live_reload.sockjs_prefix.as_str())
    } else {
        (TransportMode::Ws, live_reload.ws_path.as_str())
    };

    Json(ClientRuntimeConfig::resolve(
        &state.config.client,
        transport,
        &server.host,
        server.port,
        path,
    ))
}
