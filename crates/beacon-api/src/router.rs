//! Route definitions for the Beacon HTTP layer.
//!
//! Transport endpoints are mounted according to the configured transport
//! mode; both can coexist. Everything sits behind the host-validation
//! middleware, and unmatched paths fall through to the compiled-output
//! static file service.

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let live_reload = &state.config.live_reload;

    let mut router = Router::new()
        .route("/beacon/health", get(handlers::health::health_check))
        .route("/beacon/client-config", get(handlers::client::client_config))
        .route("/beacon/build-event", post(handlers::build::ingest_event));

    if live_reload.transport.serves_ws() {
        router = router.route(&live_reload.ws_path, get(handlers::ws::ws_upgrade));
    }

    if live_reload.transport.serves_sockjs() {
        let sockjs = Router::new()
            .route("/info", get(handlers::sockjs::info))
            .route("/{server}/{session}/xhr", post(handlers::sockjs::xhr_poll))
            .route(
                "/{server}/{session}/xhr_send",
                post(handlers::sockjs::xhr_send),
            )
            .route(
                "/{server}/{session}/websocket",
                get(handlers::sockjs::ws_upgrade),
            );
        router = router.nest(&live_reload.sockjs_prefix, sockjs);
    }

    if state.config.statics.enabled {
        router = router.fallback_service(ServeDir::new(&state.config.statics.directory));
    }

    let cors = build_cors_layer(&state);

    router
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::host_check::validate_host,
        ))
        .with_state(state)
}

/// Build the CORS layer from configuration.
fn build_cors_layer(state: &AppState) -> CorsLayer {
    use axum::http::HeaderValue;
    use tower_http::cors::Any;

    let origins = &state.config.server.cors_allowed_origins;

    if origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    }
}
