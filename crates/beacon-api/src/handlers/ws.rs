//! Native WebSocket transport endpoint.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::warn;

use beacon_livereload::transport::{Frame, TransportKind};

use crate::error::ApiError;
use crate::middleware::host_check;
use crate::state::AppState;

/// GET on the configured WS path — WebSocket upgrade.
///
/// The Origin header is validated before the upgrade; a disallowed origin
/// gets a 403 response, never a silently dropped socket.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    host_check::check_origin_header(&headers, &state.config.server)?;
    Ok(ws.on_upgrade(move |socket| handle_socket(state, socket)))
}

/// Drives one established WebSocket connection.
async fn handle_socket(state: AppState, socket: WebSocket) {
    let (handle, mut outbound_rx) = state.engine.accept(TransportKind::Ws).await;
    let conn_id = handle.id;

    let (mut ws_tx, mut ws_rx) = socket.split();

    // Outbound: frame queue → native WebSocket frames.
    let forwarder = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            let message = match frame {
                Frame::Data(payload) => Message::Text(payload.into()),
                Frame::Ping => Message::Ping(axum::body::Bytes::new()),
                Frame::Close => {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                }
            };
            if ws_tx.send(message).await.is_err() {
                break;
            }
        }
    });

    // Inbound: pongs feed liveness; text frames go through the codec.
    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(Message::Pong(_)) => state.engine.record_pong(&conn_id).await,
            Ok(Message::Text(text)) => state.engine.handle_inbound(&conn_id, text.as_str()).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(conn_id = %conn_id, error = %e, "websocket read error");
                break;
            }
        }
    }

    forwarder.abort();
    state.engine.disconnect(&conn_id);
}
