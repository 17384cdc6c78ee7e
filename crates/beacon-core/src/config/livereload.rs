//! Live-reload notification engine configuration.

use serde::{Deserialize, Serialize};

/// Which transports the server mounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// Native WebSocket only.
    Ws,
    /// SockJS HTTP fallback only.
    Sockjs,
    /// Both endpoints mounted side by side.
    Both,
    /// No live-reload endpoints at all.
    Off,
}

impl TransportMode {
    /// Whether the native WebSocket endpoint is mounted.
    pub fn serves_ws(self) -> bool {
        matches!(self, Self::Ws | Self::Both)
    }

    /// Whether the SockJS endpoints are mounted.
    pub fn serves_sockjs(self) -> bool {
        matches!(self, Self::Sockjs | Self::Both)
    }
}

/// Live-reload (build-status broadcast) engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveReloadConfig {
    /// Transport selection.
    #[serde(default = "default_transport")]
    pub transport: TransportMode,
    /// Upgrade path for the native WebSocket transport.
    #[serde(default = "default_ws_path")]
    pub ws_path: String,
    /// URL prefix for the SockJS endpoints.
    #[serde(default = "default_sockjs_prefix")]
    pub sockjs_prefix: String,
    /// Heartbeat interval in milliseconds. A connection that misses two
    /// consecutive heartbeats is terminated.
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_ms: u64,
    /// Per-connection outbound queue depth.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// Delay before the single retry of a failed unicast send, in
    /// milliseconds.
    #[serde(default = "default_send_retry_delay")]
    pub send_retry_delay_ms: u64,
}

impl Default for LiveReloadConfig {
    fn default() -> Self {
        Self {
            transport: default_transport(),
            ws_path: default_ws_path(),
            sockjs_prefix: default_sockjs_prefix(),
            heartbeat_interval_ms: default_heartbeat_interval(),
            channel_buffer_size: default_channel_buffer(),
            send_retry_delay_ms: default_send_retry_delay(),
        }
    }
}

impl LiveReloadConfig {
    /// Heartbeat interval as a [`std::time::Duration`].
    pub fn heartbeat_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.heartbeat_interval_ms)
    }

    /// Send retry delay as a [`std::time::Duration`].
    pub fn send_retry_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.send_retry_delay_ms)
    }
}

fn default_transport() -> TransportMode {
    TransportMode::Ws
}

fn default_ws_path() -> String {
    "/ws".to_string()
}

fn default_sockjs_prefix() -> String {
    "/sockjs-node".to_string()
}

fn default_heartbeat_interval() -> u64 {
    30_000
}

fn default_channel_buffer() -> usize {
    256
}

fn default_send_retry_delay() -> u64 {
    500
}
