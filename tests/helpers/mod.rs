//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use beacon_api::state::AppState;
use beacon_core::config::AppConfig;
use beacon_core::config::livereload::TransportMode;
use beacon_livereload::LiveReloadEngine;

/// A Beacon instance bound to an ephemeral port.
pub struct TestServer {
    /// Bound address.
    pub addr: SocketAddr,
    /// The live-reload engine behind the router.
    pub engine: Arc<LiveReloadEngine>,
}

impl TestServer {
    /// Spawn a server with both transports mounted and short timeouts.
    pub async fn spawn() -> Self {
        let mut config = AppConfig::default();
        config.live_reload.transport = TransportMode::Both;
        config.live_reload.heartbeat_interval_ms = 1_000;
        config.statics.enabled = false;
        let config = Arc::new(config);

        let engine = LiveReloadEngine::new(config.live_reload.clone());
        let state = AppState {
            config: Arc::clone(&config),
            engine: Arc::clone(&engine),
        };

        let app = beacon_api::build_router(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("test server");
        });

        Self { addr, engine }
    }

    /// HTTP URL for a path on this server.
    pub fn http(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// WebSocket URL for a path on this server.
    pub fn ws(&self, path: &str) -> String {
        format!("ws://{}{path}", self.addr)
    }

    /// Post one compiler event through the build-event intake.
    pub async fn post_build_event(&self, event: serde_json::Value) {
        let response = reqwest::Client::new()
            .post(self.http("/beacon/build-event"))
            .json(&event)
            .send()
            .await
            .expect("post build event");
        assert_eq!(response.status(), 202, "build event not accepted");
    }
}

/// A clean `done` event with one emitted asset.
pub fn clean_done_event(hash: &str) -> serde_json::Value {
    serde_json::json!({
        "event": "done",
        "stats": {
            "hash": hash,
            "errors": [],
            "warnings": [],
            "assets": [{"name": "main.js", "emitted": true}],
        },
    })
}
