//! SockJS-compatible fallback transport.
//!
//! Implements the subset of the SockJS server protocol the browser client
//! actually uses: the `/info` greeting, xhr-polling sessions, `xhr_send`
//! uplink, and the raw-WebSocket sub-endpoint. Framing:
//!
//! - `o` — session open
//! - `h` — heartbeat
//! - `a["...","..."]` — message batch (each element is one wire-message frame)
//! - `c[code,"reason"]` — session close
//!
//! There is no native frame-level ping here; the heartbeat monitor's
//! [`Frame::Ping`] becomes an `h` frame on the data channel, and any inbound
//! client activity counts as liveness.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use serde_json::json;
use tokio::sync::{Mutex, mpsc};
use tracing::debug;

use beacon_core::{AppError, AppResult};

use crate::connection::handle::ConnectionId;
use crate::transport::Frame;

/// Body of the `/info` greeting.
pub fn info_payload() -> serde_json::Value {
    json!({
        "websocket": true,
        "origins": ["*:*"],
        "cookie_needed": false,
        "entropy": rand::random::<u32>(),
    })
}

/// Session-open frame.
pub fn open_frame() -> &'static str {
    "o"
}

/// Heartbeat frame.
pub fn heartbeat_frame() -> &'static str {
    "h"
}

/// Batch one or more encoded wire messages into an `a[...]` frame.
pub fn message_frame(payloads: &[String]) -> String {
    format!("a{}", serde_json::Value::from(payloads.to_vec()))
}

/// Session-close frame.
pub fn close_frame(code: u16, reason: &str) -> String {
    format!("c[{code},{}]", serde_json::Value::from(reason))
}

/// Session IDs may not be empty, contain dots, or escape the URL segment.
pub fn valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Parse an `xhr_send` body: a JSON array of frame strings.
pub fn parse_send_payload(body: &str) -> AppResult<Vec<String>> {
    if body.is_empty() {
        return Err(AppError::validation("Payload expected."));
    }
    serde_json::from_str::<Vec<String>>(body)
        .map_err(|_| AppError::validation("Broken JSON encoding."))
}

/// What one poll cycle hands back to the HTTP layer.
#[derive(Debug, PartialEq)]
pub enum PollOutcome {
    /// First poll of a fresh session: send `o`.
    Open,
    /// A data or heartbeat frame.
    Frame(String),
    /// Session is over; send the close frame and forget the session.
    Closed(String),
}

/// One SockJS session bound to a live-reload connection.
#[derive(Debug)]
pub struct SockJsSession {
    /// The connection this session feeds.
    pub conn_id: ConnectionId,
    rx: Mutex<mpsc::Receiver<Frame>>,
    opened: AtomicBool,
}

impl SockJsSession {
    /// Wrap a connection's outbound queue in a session.
    pub fn new(conn_id: ConnectionId, rx: mpsc::Receiver<Frame>) -> Self {
        Self {
            conn_id,
            rx: Mutex::new(rx),
            opened: AtomicBool::new(false),
        }
    }

    /// Produce the body for one xhr-poll cycle.
    ///
    /// Waits up to `window` for a frame; an empty window yields a heartbeat
    /// so intermediaries do not reap the idle HTTP connection. Consecutive
    /// queued data frames are batched into one `a[...]` frame.
    pub async fn next_poll(&self, window: Duration) -> PollOutcome {
        if !self.opened.swap(true, Ordering::SeqCst) {
            return PollOutcome::Open;
        }

        let mut rx = self.rx.lock().await;
        let first = match tokio::time::timeout(window, rx.recv()).await {
            Err(_) => return PollOutcome::Frame(heartbeat_frame().to_string()),
            Ok(None) => return PollOutcome::Closed(close_frame(3000, "Go away!")),
            Ok(Some(frame)) => frame,
        };

        match first {
            Frame::Ping => PollOutcome::Frame(heartbeat_frame().to_string()),
            Frame::Close => PollOutcome::Closed(close_frame(1000, "Normal closure")),
            Frame::Data(payload) => {
                let mut batch = vec![payload];
                while let Ok(Frame::Data(more)) = rx.try_recv() {
                    batch.push(more);
                }
                PollOutcome::Frame(message_frame(&batch))
            }
        }
    }
}

/// All open SockJS sessions, keyed by session ID.
#[derive(Debug, Default)]
pub struct SockJsSessionStore {
    sessions: DashMap<String, Arc<SockJsSession>>,
}

impl SockJsSessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Register a fresh session.
    pub fn register(&self, session_id: String, session: Arc<SockJsSession>) {
        debug!(session_id = %session_id, conn_id = %session.conn_id, "sockjs session opened");
        self.sessions.insert(session_id, session);
    }

    /// Look up an open session.
    pub fn get(&self, session_id: &str) -> Option<Arc<SockJsSession>> {
        self.sessions.get(session_id).map(|e| Arc::clone(e.value()))
    }

    /// Forget a session.
    pub fn remove(&self, session_id: &str) -> Option<Arc<SockJsSession>> {
        self.sessions.remove(session_id).map(|(_, s)| s)
    }

    /// Number of open sessions.
    pub fn count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(20);

    #[test]
    fn frames_are_sockjs_shaped() {
        assert_eq!(message_frame(&[r#"{"type":"ok"}"#.to_string()]), r#"a["{\"type\":\"ok\"}"]"#);
        assert_eq!(close_frame(3000, "Go away!"), r#"c[3000,"Go away!"]"#);
    }

    #[test]
    fn session_ids_are_validated() {
        assert!(valid_session_id("abc-123_x"));
        assert!(!valid_session_id(""));
        assert!(!valid_session_id("../../etc"));
        assert!(!valid_session_id("a.b"));
    }

    #[test]
    fn send_payload_must_be_a_string_array() {
        assert_eq!(
            parse_send_payload(r#"["{\"type\":\"ok\"}"]"#).unwrap(),
            vec![r#"{"type":"ok"}"#.to_string()]
        );
        assert!(parse_send_payload("").is_err());
        assert!(parse_send_payload("{}").is_err());
    }

    #[tokio::test]
    async fn first_poll_opens_then_batches_data() {
        let (tx, rx) = mpsc::channel(8);
        let session = SockJsSession::new(uuid::Uuid::new_v4(), rx);

        assert_eq!(session.next_poll(WINDOW).await, PollOutcome::Open);

        tx.send(Frame::Data(r#"{"type":"hash","data":"a1"}"#.into()))
            .await
            .unwrap();
        tx.send(Frame::Data(r#"{"type":"ok"}"#.into())).await.unwrap();

        match session.next_poll(WINDOW).await {
            PollOutcome::Frame(frame) => {
                assert!(frame.starts_with("a["));
                assert!(frame.contains("hash"));
                assert!(frame.contains("ok"));
            }
            other => panic!("expected data frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn idle_poll_yields_heartbeat_and_ping_is_emulated() {
        let (tx, rx) = mpsc::channel(8);
        let session = SockJsSession::new(uuid::Uuid::new_v4(), rx);
        assert_eq!(session.next_poll(WINDOW).await, PollOutcome::Open);

        // Idle window: heartbeat.
        assert_eq!(
            session.next_poll(WINDOW).await,
            PollOutcome::Frame("h".to_string())
        );

        // Monitor ping arrives over the same data channel.
        tx.send(Frame::Ping).await.unwrap();
        assert_eq!(
            session.next_poll(WINDOW).await,
            PollOutcome::Frame("h".to_string())
        );
    }

    #[tokio::test]
    async fn close_and_dropped_queue_end_the_session() {
        let (tx, rx) = mpsc::channel(8);
        let session = SockJsSession::new(uuid::Uuid::new_v4(), rx);
        assert_eq!(session.next_poll(WINDOW).await, PollOutcome::Open);

        tx.send(Frame::Close).await.unwrap();
        assert_eq!(
            session.next_poll(WINDOW).await,
            PollOutcome::Closed(r#"c[1000,"Normal closure"]"#.to_string())
        );

        drop(tx);
        assert_eq!(
            session.next_poll(WINDOW).await,
            PollOutcome::Closed(r#"c[3000,"Go away!"]"#.to_string())
        );
    }
}
