//! Top-level live-reload engine that ties the subsystems together.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use beacon_build::status::StatusSource;
use beacon_core::config::livereload::LiveReloadConfig;

use crate::broadcast::BroadcastController;
use crate::connection::handle::{ConnectionHandle, ConnectionId};
use crate::connection::heartbeat::{HeartbeatConfig, run_heartbeat};
use crate::connection::registry::ConnectionRegistry;
use crate::message::codec::{self, Decoded};
use crate::message::types::WireMessage;
use crate::transport::sockjs::{SockJsSession, SockJsSessionStore};
use crate::transport::{Frame, TransportKind};

/// Central engine: one per server instance.
///
/// Owns the registry and the cached status (through the status source); all
/// other components act through it, preserving the single-writer discipline
/// on connection membership.
pub struct LiveReloadEngine {
    config: LiveReloadConfig,
    registry: Arc<ConnectionRegistry>,
    status: Arc<StatusSource>,
    controller: Arc<BroadcastController>,
    sockjs_sessions: Arc<SockJsSessionStore>,
}

impl std::fmt::Debug for LiveReloadEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveReloadEngine")
            .field("connections", &self.registry.count())
            .finish()
    }
}

impl LiveReloadEngine {
    /// Create an engine with its own status source.
    pub fn new(config: LiveReloadConfig) -> Arc<Self> {
        Self::with_status_source(config, Arc::new(StatusSource::new()))
    }

    /// Create an engine subscribed to an existing status source
    /// (e.g. a multi-compiler aggregate).
    pub fn with_status_source(config: LiveReloadConfig, status: Arc<StatusSource>) -> Arc<Self> {
        let registry = Arc::new(ConnectionRegistry::new());
        let controller = Arc::new(BroadcastController::new(
            Arc::clone(&registry),
            Arc::clone(&status),
            config.send_retry_delay(),
        ));

        // Explicit subscriptions, invoked synchronously in status order.
        let on_status = Arc::clone(&controller);
        status.on_update(move |transition| on_status.publish(transition));
        let on_progress = Arc::clone(&controller);
        status.on_progress(move |percent, message| on_progress.publish_progress(percent, message));

        info!("live-reload engine initialized");

        Arc::new(Self {
            config,
            registry,
            status,
            controller,
            sockjs_sessions: Arc::new(SockJsSessionStore::new()),
        })
    }

    /// The status source this engine broadcasts for.
    pub fn status_source(&self) -> Arc<StatusSource> {
        Arc::clone(&self.status)
    }

    /// Open SockJS sessions (used by the HTTP layer).
    pub fn sockjs_sessions(&self) -> Arc<SockJsSessionStore> {
        Arc::clone(&self.sockjs_sessions)
    }

    /// Accept a new client connection on the given transport.
    ///
    /// Registers the connection, starts its heartbeat, and performs the
    /// bootstrap unicast. Because registration happens before the bootstrap,
    /// a build finishing in the same instant can enqueue its broadcast
    /// first — the bootstrap then reflects that newer status, so the client
    /// still converges on the latest build either way.
    pub async fn accept(&self, transport: TransportKind) -> (Arc<ConnectionHandle>, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(self.config.channel_buffer_size);
        let handle = Arc::new(ConnectionHandle::new(transport, tx));

        self.registry.add(Arc::clone(&handle));

        tokio::spawn(run_heartbeat(
            Arc::clone(&handle),
            Arc::clone(&self.registry),
            HeartbeatConfig {
                interval: self.config.heartbeat_interval(),
            },
        ));

        self.controller.bootstrap(&handle).await;

        info!(
            conn_id = %handle.id,
            transport = %handle.transport,
            total = self.registry.count(),
            "client connected"
        );

        (handle, rx)
    }

    /// Accept a new SockJS connection and bind it to a session ID.
    pub async fn open_sockjs_session(&self, session_id: String) -> Arc<SockJsSession> {
        let (handle, rx) = self.accept(TransportKind::Sockjs).await;
        let session = Arc::new(SockJsSession::new(handle.id, rx));
        self.sockjs_sessions
            .register(session_id, Arc::clone(&session));
        session
    }

    /// Tear down a SockJS session and its connection.
    pub fn close_sockjs_session(&self, session_id: &str) {
        if let Some(session) = self.sockjs_sessions.remove(session_id) {
            self.disconnect(&session.conn_id);
        }
    }

    /// Process one inbound frame from a client.
    ///
    /// The protocol is push-only, so inbound data only feeds liveness and
    /// diagnostics. A malformed frame is logged and ignored — it never
    /// closes the connection.
    pub async fn handle_inbound(&self, conn_id: &ConnectionId, raw: &str) {
        self.record_pong(conn_id).await;

        match codec::decode(raw) {
            Decoded::Message(message) => {
                debug!(conn_id = %conn_id, message = ?message, "inbound client message");
            }
            Decoded::Unrecognized { message_type } => {
                debug!(
                    conn_id = %conn_id,
                    message_type = message_type.as_deref().unwrap_or("<not json>"),
                    "ignoring unrecognized inbound frame"
                );
            }
        }
    }

    /// Record liveness for a connection (native pong or SockJS activity).
    pub async fn record_pong(&self, conn_id: &ConnectionId) {
        if let Some(handle) = self.registry.get(conn_id) {
            handle.record_pong().await;
        }
    }

    /// Remove a connection from the registry.
    pub fn disconnect(&self, conn_id: &ConnectionId) {
        if let Some(handle) = self.registry.remove(conn_id) {
            handle.mark_dead();
            info!(
                conn_id = %conn_id,
                total = self.registry.count(),
                "client disconnected"
            );
        }
    }

    /// Number of open connections (diagnostics and tests).
    pub fn connection_count(&self) -> usize {
        self.registry.count()
    }

    /// Notify all clients that a watched static file changed.
    pub fn broadcast_static_changed(&self, path: Option<&str>) {
        self.controller.publish_static_changed(path);
    }

    /// Push a client console log-level directive to all clients.
    pub fn broadcast_log_level(&self, level: &str) {
        self.controller.publish_log_level(level);
    }

    /// Shut the engine down: tell every client to stop reconnecting, then
    /// drain the registry entry by entry.
    pub fn shutdown(&self) {
        info!(connections = self.registry.count(), "shutting down live-reload engine");
        if let Ok(frame) = codec::encode(&WireMessage::Close) {
            self.registry.broadcast(&frame);
        }
        self.registry.close_all();
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::error::TryRecvError;

    use super::*;
    use beacon_build::events::CompilerEvent;
    use beacon_build::stats::{AssetStat, BuildStats};

    fn test_config() -> LiveReloadConfig {
        LiveReloadConfig {
            heartbeat_interval_ms: 10_000, // keep heartbeats out of these tests
            send_retry_delay_ms: 10,
            ..LiveReloadConfig::default()
        }
    }

    fn clean_done(hash: &str) -> CompilerEvent {
        CompilerEvent::Done {
            stats: BuildStats {
                hash: hash.to_string(),
                errors: vec![],
                warnings: vec![],
                assets: vec![AssetStat {
                    name: "main.js".into(),
                    emitted: true,
                }],
            },
        }
    }

    async fn expect_data(rx: &mut mpsc::Receiver<Frame>) -> String {
        match rx.recv().await {
            Some(Frame::Data(frame)) => frame,
            other => panic!("expected data frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn client_connecting_while_idle_receives_nothing_until_first_build() {
        let engine = LiveReloadEngine::new(test_config());
        let (_handle, mut rx) = engine.accept(TransportKind::Ws).await;

        // Scenario C, client A: idle means no bootstrap traffic.
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

        engine.status_source().handle_event(clean_done("abc123"));
        assert_eq!(expect_data(&mut rx).await, r#"{"type":"hash","data":"abc123"}"#);
        assert_eq!(expect_data(&mut rx).await, r#"{"type":"ok"}"#);
    }

    #[tokio::test]
    async fn late_joiner_receives_cached_status_immediately() {
        let engine = LiveReloadEngine::new(test_config());
        engine.status_source().handle_event(clean_done("abc123"));

        // Scenario C, client B: bootstrap unicast replays the build result.
        let (_handle, mut rx) = engine.accept(TransportKind::Ws).await;
        assert_eq!(expect_data(&mut rx).await, r#"{"type":"hash","data":"abc123"}"#);
        assert_eq!(expect_data(&mut rx).await, r#"{"type":"ok"}"#);
    }

    #[tokio::test]
    async fn error_build_broadcasts_errors_only() {
        let engine = LiveReloadEngine::new(test_config());
        let (_handle, mut rx) = engine.accept(TransportKind::Ws).await;

        engine.status_source().handle_event(CompilerEvent::Done {
            stats: BuildStats {
                hash: "broken".into(),
                errors: vec!["Module not found".into()],
                warnings: vec!["unused".into()],
                assets: vec![],
            },
        });

        assert_eq!(
            expect_data(&mut rx).await,
            r#"{"type":"errors","data":["Module not found"]}"#
        );
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn sequential_builds_arrive_in_order() {
        let engine = LiveReloadEngine::new(test_config());
        let (_handle, mut rx) = engine.accept(TransportKind::Ws).await;

        engine.status_source().handle_event(clean_done("a1"));
        engine.status_source().handle_event(CompilerEvent::Invalid);
        engine.status_source().handle_event(clean_done("a2"));

        assert_eq!(expect_data(&mut rx).await, r#"{"type":"hash","data":"a1"}"#);
        assert_eq!(expect_data(&mut rx).await, r#"{"type":"ok"}"#);
        assert_eq!(expect_data(&mut rx).await, r#"{"type":"invalid"}"#);
        assert_eq!(expect_data(&mut rx).await, r#"{"type":"hash","data":"a2"}"#);
        assert_eq!(expect_data(&mut rx).await, r#"{"type":"ok"}"#);
    }

    #[tokio::test]
    async fn progress_is_broadcast_immediately() {
        let engine = LiveReloadEngine::new(test_config());
        let (_handle, mut rx) = engine.accept(TransportKind::Ws).await;

        engine.status_source().handle_event(CompilerEvent::Progress {
            percent: 55,
            message: "building modules".into(),
        });

        assert_eq!(
            expect_data(&mut rx).await,
            r#"{"type":"progress-update","data":{"percent":55,"message":"building modules"}}"#
        );
    }

    #[tokio::test]
    async fn shutdown_tells_clients_to_stop_reconnecting() {
        let engine = LiveReloadEngine::new(test_config());
        let (handle, mut rx) = engine.accept(TransportKind::Ws).await;

        engine.shutdown();

        assert_eq!(expect_data(&mut rx).await, r#"{"type":"close"}"#);
        assert_eq!(rx.recv().await, Some(Frame::Close));
        assert_eq!(engine.connection_count(), 0);
        assert!(!handle.is_alive());
    }

    #[tokio::test]
    async fn sockjs_session_feeds_the_same_broadcast_path() {
        let engine = LiveReloadEngine::new(test_config());
        let session = engine.open_sockjs_session("sess-1".into()).await;
        assert_eq!(engine.connection_count(), 1);

        assert_eq!(
            session.next_poll(std::time::Duration::from_millis(20)).await,
            crate::transport::sockjs::PollOutcome::Open
        );

        engine.status_source().handle_event(clean_done("abc123"));
        match session.next_poll(std::time::Duration::from_millis(200)).await {
            crate::transport::sockjs::PollOutcome::Frame(frame) => {
                assert!(frame.starts_with("a["));
                assert!(frame.contains("abc123"));
            }
            other => panic!("expected data frame, got {other:?}"),
        }

        engine.close_sockjs_session("sess-1");
        assert_eq!(engine.connection_count(), 0);
    }
}
