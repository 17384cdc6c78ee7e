//! SockJS fallback transport endpoints.
//!
//! `GET {prefix}/info` greeting, xhr-polling downlink, `xhr_send` uplink,
//! and the SockJS-framed WebSocket sub-endpoint. All session and framing
//! logic lives in `beacon_livereload::transport::sockjs`; these handlers
//! only adapt it to HTTP.

use axum::Json;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use tracing::warn;

use beacon_core::AppError;
use beacon_livereload::transport::sockjs::{
    self, PollOutcome, parse_send_payload, valid_session_id,
};
use beacon_livereload::transport::{Frame, TransportKind};

use crate::error::ApiError;
use crate::middleware::host_check;
use crate::state::AppState;

/// GET {prefix}/info — transport greeting consumed by the client before it
/// picks a session URL.
pub async fn info() -> Json<serde_json::Value> {
    Json(sockjs::info_payload())
}

/// POST {prefix}/{server}/{session}/xhr — downlink poll.
///
/// The first poll of an unknown session opens a connection; subsequent
/// polls drain its frame queue. Poll arrival counts as liveness.
pub async fn xhr_poll(
    State(state): State<AppState>,
    Path((_server, session_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    if !valid_session_id(&session_id) {
        return Err(AppError::not_found("Unknown session").into());
    }

    let sessions = state.engine.sockjs_sessions();
    let session = match sessions.get(&session_id) {
        Some(session) => {
            state.engine.record_pong(&session.conn_id).await;
            session
        }
        None => state.engine.open_sockjs_session(session_id.clone()).await,
    };

    let window = state.config.live_reload.heartbeat_interval();
    let body = match session.next_poll(window).await {
        PollOutcome::Open => format!("{}\n", sockjs::open_frame()),
        PollOutcome::Frame(frame) => format!("{frame}\n"),
        PollOutcome::Closed(frame) => {
            state.engine.close_sockjs_session(&session_id);
            format!("{frame}\n")
        }
    };

    Ok(sockjs_response(body))
}

/// POST {prefix}/{server}/{session}/xhr_send — uplink.
pub async fn xhr_send(
    State(state): State<AppState>,
    Path((_server, session_id)): Path<(String, String)>,
    body: String,
) -> Result<Response, ApiError> {
    let Some(session) = state.engine.sockjs_sessions().get(&session_id) else {
        return Err(AppError::not_found("Unknown session").into());
    };

    let payloads = parse_send_payload(&body)?;
    for payload in payloads {
        state.engine.handle_inbound(&session.conn_id, &payload).await;
    }

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// GET {prefix}/{server}/{session}/websocket — SockJS-framed WebSocket.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    Path((_server, _session_id)): Path<(String, String)>,
    ws: WebSocketUpgrade,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    host_check::check_origin_header(&headers, &state.config.server)?;
    Ok(ws.on_upgrade(move |socket| handle_socket(state, socket)))
}

/// Drives one SockJS-over-WebSocket connection.
async fn handle_socket(state: AppState, socket: WebSocket) {
    let (handle, mut outbound_rx) = state.engine.accept(TransportKind::Sockjs).await;
    let conn_id = handle.id;

    let (mut ws_tx, mut ws_rx) = socket.split();

    if ws_tx
        .send(Message::Text(sockjs::open_frame().into()))
        .await
        .is_err()
    {
        state.engine.disconnect(&conn_id);
        return;
    }

    // Outbound: frame queue → SockJS framing. Pings become `h` frames on
    // the data channel — there is no native ping on this transport.
    let forwarder = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            let message = match frame {
                Frame::Data(payload) => {
                    Message::Text(sockjs::message_frame(&[payload]).into())
                }
                Frame::Ping => Message::Text(sockjs::heartbeat_frame().into()),
                Frame::Close => {
                    let close = sockjs::close_frame(1000, "Normal closure");
                    let _ = ws_tx.send(Message::Text(close.into())).await;
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                }
            };
            if ws_tx.send(message).await.is_err() {
                break;
            }
        }
    });

    // Inbound: any activity counts as liveness; payloads may arrive as a
    // bare string or a JSON array of strings.
    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(Message::Text(text)) => {
                let raw = text.as_str();
                if raw.is_empty() {
                    state.engine.record_pong(&conn_id).await;
                    continue;
                }
                match parse_send_payload(raw) {
                    Ok(payloads) => {
                        for payload in payloads {
                            state.engine.handle_inbound(&conn_id, &payload).await;
                        }
                    }
                    Err(_) => state.engine.handle_inbound(&conn_id, raw).await,
                }
            }
            Ok(Message::Pong(_)) => state.engine.record_pong(&conn_id).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(conn_id = %conn_id, error = %e, "sockjs websocket read error");
                break;
            }
        }
    }

    forwarder.abort();
    state.engine.disconnect(&conn_id);
}

fn sockjs_response(body: String) -> Response {
    (
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=UTF-8",
        )],
        body,
    )
        .into_response()
}
