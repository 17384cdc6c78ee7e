//! Host/Origin validation — the security boundary in front of every route.
//!
//! DNS rebinding and cross-site WebSocket hijacking both arrive as requests
//! whose `Host`/`Origin` header names something other than this server. A
//! disallowed header is refused with an HTTP 403 before any upgrade happens;
//! silently accepting and dropping would leak a half-open resource and give
//! no diagnostic signal.

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::{HOST, ORIGIN};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use beacon_core::config::app::ServerConfig;
use beacon_core::{AppError, AppResult};

use crate::error::ApiError;
use crate::state::AppState;

/// Middleware validating the `Host` header of every request.
pub async fn validate_host(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if let Err(e) = check_host_header(request.headers(), &state.config.server) {
        return ApiError::from(e).into_response();
    }
    next.run(request).await
}

/// Check the `Host` header against the configured policy.
pub fn check_host_header(headers: &HeaderMap, config: &ServerConfig) -> AppResult<()> {
    let host = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::forbidden("Invalid Host header"))?;

    if permitted(hostname_of(host), config) {
        Ok(())
    } else {
        tracing::warn!(host = %host, "rejected request with disallowed Host header");
        Err(AppError::forbidden("Invalid Host header"))
    }
}

/// Check the `Origin` header, if present, against the same policy.
///
/// Used by the upgrade handlers: a browser always sends `Origin` on
/// WebSocket handshakes, so a mismatch means the page was served from
/// somewhere this server does not trust.
pub fn check_origin_header(headers: &HeaderMap, config: &ServerConfig) -> AppResult<()> {
    let Some(origin) = headers.get(ORIGIN).and_then(|v| v.to_str().ok()) else {
        return Ok(());
    };

    let authority = origin.split_once("://").map(|(_, rest)| rest).unwrap_or(origin);
    if permitted(hostname_of(authority), config) {
        Ok(())
    } else {
        tracing::warn!(origin = %origin, "rejected upgrade with disallowed Origin header");
        Err(AppError::forbidden("Invalid Origin header"))
    }
}

fn permitted(hostname: &str, config: &ServerConfig) -> bool {
    config
        .allowed_hosts
        .permits(hostname, config.public_host.as_deref())
}

/// Strip the port from a host header value, keeping IPv6 brackets intact.
fn hostname_of(host: &str) -> &str {
    if let Some(end) = host.find(']') {
        return &host[..=end];
    }
    host.split(':').next().unwrap_or(host)
}
