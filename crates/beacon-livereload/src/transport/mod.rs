//! Transport normalization.
//!
//! Both transports reduce a client to the same shape: a
//! [`crate::connection::handle::ConnectionHandle`] plus an outbound
//! [`Frame`] queue. The HTTP layer drains the queue and maps each frame to
//! the transport's native encoding (WebSocket frames, SockJS framing).
//! Everything above the queue — registry, heartbeat, broadcast — is written
//! once against the uniform interface.

pub mod sockjs;

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::connection::handle::ConnectionHandle;

/// Which transport produced a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Native WebSocket.
    Ws,
    /// SockJS long-poll/WebSocket hybrid.
    Sockjs,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ws => write!(f, "ws"),
            Self::Sockjs => write!(f, "sockjs"),
        }
    }
}

/// One outbound unit on a connection's queue.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// A wire-message payload, already encoded to JSON.
    Data(String),
    /// Liveness probe. WS maps this to a native ping frame; SockJS emits a
    /// heartbeat frame on the data channel.
    Ping,
    /// Terminate the connection after flushing.
    Close,
}

/// Send a frame, retrying once after `retry_delay` if the first attempt
/// fails while the connection still looks alive.
///
/// The retry is a best-effort mitigation for the narrow window where a
/// freshly accepted socket has not drained its queue yet. It is not a
/// delivery guarantee and must not grow into a retry queue.
pub async fn send_with_retry(handle: &ConnectionHandle, frame: Frame, retry_delay: Duration) -> bool {
    if handle.send(frame.clone()) {
        return true;
    }
    if !handle.is_alive() {
        return false;
    }
    debug!(conn_id = %handle.id, "send failed, retrying once");
    tokio::time::sleep(retry_delay).await;
    handle.send(frame)
}
