//! Ping/pong heartbeat for connection liveness.
//!
//! Detects half-open TCP connections (client machine slept, network
//! dropped) that neither OS reports as closed. Without this the registry
//! would accumulate dead entries and broadcasts would waste time on sends
//! that never complete.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tracing::{debug, warn};

use crate::transport::Frame;

use super::handle::ConnectionHandle;
use super::registry::ConnectionRegistry;

/// Heartbeat configuration.
#[derive(Debug, Clone, Copy)]
pub struct HeartbeatConfig {
    /// Interval between ticks. A connection that has not answered the
    /// previous tick's ping by the next tick is terminated, so the worst
    /// case detection latency is twice this interval.
    pub interval: Duration,
}

/// Run the heartbeat loop for one connection.
///
/// Per-connection state machine: each tick either sends a ping and enters
/// the awaiting-pong state, or — if the previous ping is still unanswered —
/// terminates the connection through the registry.
pub async fn run_heartbeat(
    handle: Arc<ConnectionHandle>,
    registry: Arc<ConnectionRegistry>,
    config: HeartbeatConfig,
) {
    let mut ticker = time::interval(config.interval);
    // The first tick fires immediately; the connection just opened, skip it.
    ticker.tick().await;

    loop {
        ticker.tick().await;

        if !handle.is_alive() {
            registry.remove(&handle.id);
            break;
        }

        if handle.is_awaiting_pong() {
            let last_pong = handle.last_pong().await;
            warn!(
                conn_id = %handle.id,
                transport = %handle.transport,
                last_pong = %last_pong,
                "heartbeat timeout, terminating connection"
            );
            let _ = handle.send(Frame::Close);
            handle.mark_dead();
            registry.remove(&handle.id);
            break;
        }

        handle.begin_ping();
        if !handle.send(Frame::Ping) {
            handle.mark_dead();
            registry.remove(&handle.id);
            break;
        }
    }

    debug!(conn_id = %handle.id, "heartbeat loop ended");
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::transport::TransportKind;

    const TICK: Duration = Duration::from_millis(20);

    #[tokio::test]
    async fn unresponsive_connection_is_terminated_within_two_intervals() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (tx, mut rx) = mpsc::channel(8);
        let handle = Arc::new(ConnectionHandle::new(TransportKind::Ws, tx));
        registry.add(Arc::clone(&handle));

        let monitor = tokio::spawn(run_heartbeat(
            Arc::clone(&handle),
            Arc::clone(&registry),
            HeartbeatConfig { interval: TICK },
        ));

        // Never answer the ping.
        monitor.await.unwrap();

        assert!(!handle.is_alive());
        assert_eq!(registry.count(), 0);
        assert_eq!(rx.recv().await, Some(Frame::Ping));
        assert_eq!(rx.recv().await, Some(Frame::Close));
    }

    #[tokio::test]
    async fn responsive_connection_stays_registered() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (tx, mut rx) = mpsc::channel(8);
        let handle = Arc::new(ConnectionHandle::new(TransportKind::Ws, tx));
        registry.add(Arc::clone(&handle));

        tokio::spawn(run_heartbeat(
            Arc::clone(&handle),
            Arc::clone(&registry),
            HeartbeatConfig { interval: TICK },
        ));

        // Answer three pings, then hang up.
        for _ in 0..3 {
            assert_eq!(rx.recv().await, Some(Frame::Ping));
            assert_eq!(registry.count(), 1);
            handle.record_pong().await;
        }

        handle.mark_dead();
        tokio::time::sleep(TICK * 3).await;
        assert_eq!(registry.count(), 0);
    }

    #[tokio::test]
    async fn heartbeat_survives_multiple_connections_dropping_one() {
        let registry = Arc::new(ConnectionRegistry::new());

        let (tx_a, mut rx_a) = mpsc::channel(8);
        let alive = Arc::new(ConnectionHandle::new(TransportKind::Ws, tx_a));
        let (tx_b, _rx_b) = mpsc::channel(8);
        let silent = Arc::new(ConnectionHandle::new(TransportKind::Sockjs, tx_b));

        registry.add(Arc::clone(&alive));
        registry.add(Arc::clone(&silent));

        tokio::spawn(run_heartbeat(
            Arc::clone(&alive),
            Arc::clone(&registry),
            HeartbeatConfig { interval: TICK },
        ));
        let silent_monitor = tokio::spawn(run_heartbeat(
            Arc::clone(&silent),
            Arc::clone(&registry),
            HeartbeatConfig { interval: TICK },
        ));

        // Keep the first connection responsive until the silent one dies.
        let responder = tokio::spawn(async move {
            while let Some(frame) = rx_a.recv().await {
                if frame == Frame::Ping {
                    alive.record_pong().await;
                }
            }
        });

        silent_monitor.await.unwrap();
        assert_eq!(registry.count(), 1);
        assert!(registry.broadcast(r#"{"type":"ok"}"#) == 1);
        responder.abort();
    }
}
