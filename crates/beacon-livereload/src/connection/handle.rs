//! Individual client connection handle.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::transport::{Frame, TransportKind};

/// Unique connection identifier.
pub type ConnectionId = Uuid;

/// A handle to a single client connection.
///
/// Holds the sender side of the outbound frame queue plus liveness state.
/// The registry owns membership; the transport loop owns the receiver side
/// of the queue. Per-connection FIFO ordering falls out of the queue.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID.
    pub id: ConnectionId,
    /// Which transport produced this connection.
    pub transport: TransportKind,
    /// When the connection was accepted.
    pub connected_at: DateTime<Utc>,
    sender: mpsc::Sender<Frame>,
    alive: AtomicBool,
    awaiting_pong: AtomicBool,
    last_pong: tokio::sync::RwLock<DateTime<Utc>>,
}

impl ConnectionHandle {
    /// Create a new handle around the sender side of a frame queue.
    pub fn new(transport: TransportKind, sender: mpsc::Sender<Frame>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            transport,
            connected_at: now,
            sender,
            alive: AtomicBool::new(true),
            awaiting_pong: AtomicBool::new(false),
            last_pong: tokio::sync::RwLock::new(now),
        }
    }

    /// Queue an outbound frame. Returns `false` if the frame could not be
    /// queued; a closed queue also marks the connection dead.
    pub fn send(&self, frame: Frame) -> bool {
        if !self.is_alive() {
            return false;
        }
        match self.sender.try_send(frame) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(conn_id = %self.id, "send buffer full, dropping frame");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                false
            }
        }
    }

    /// Whether the connection is still considered live.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark the connection dead. Idempotent.
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Record a pong (or equivalent inbound activity on SockJS).
    pub async fn record_pong(&self) {
        self.awaiting_pong.store(false, Ordering::SeqCst);
        let mut lp = self.last_pong.write().await;
        *lp = Utc::now();
    }

    /// Enter the awaiting-pong heartbeat state.
    pub fn begin_ping(&self) {
        self.awaiting_pong.store(true, Ordering::SeqCst);
    }

    /// Whether a ping is outstanding without a pong.
    pub fn is_awaiting_pong(&self) -> bool {
        self.awaiting_pong.load(Ordering::SeqCst)
    }

    /// When the last pong was recorded.
    pub async fn last_pong(&self) -> DateTime<Utc> {
        *self.last_pong.read().await
    }
}
