//! Browser-client contract configuration.
//!
//! These settings are not used by the server loop itself; they are
//! serialized into the client runtime config embedded at bundle-build time
//! (endpoint URL, reconnect policy, overlay behavior).

use serde::{Deserialize, Serialize};

/// Browser-client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Endpoint URL override. When absent the URL is derived from the
    /// server bind address and the transport path.
    #[serde(default)]
    pub web_socket_url: Option<WebSocketUrl>,
    /// Whether the client renders the full-page build-error overlay.
    #[serde(default = "default_true")]
    pub overlay: bool,
    /// Client console log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Reconnect/backoff policy observed by the client.
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            web_socket_url: None,
            overlay: true,
            log_level: default_log_level(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// Endpoint URL, either a raw string or individual parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WebSocketUrl {
    /// Full URL taken verbatim, e.g. `"wss://dev.example.com/ws"`.
    Raw(String),
    /// Individual parts, each falling back to a server-derived default.
    Parts(WebSocketUrlParts),
}

/// Structured endpoint URL parts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebSocketUrlParts {
    /// `"ws"` or `"wss"`.
    #[serde(default)]
    pub protocol: Option<String>,
    /// Hostname.
    #[serde(default)]
    pub host: Option<String>,
    /// Port.
    #[serde(default)]
    pub port: Option<u16>,
    /// Endpoint path.
    #[serde(default)]
    pub path: Option<String>,
    /// Basic-auth username.
    #[serde(default)]
    pub username: Option<String>,
    /// Basic-auth password.
    #[serde(default)]
    pub password: Option<String>,
}

/// Client reconnect/backoff policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// Maximum reconnect attempts; `None` retries indefinitely.
    #[serde(default)]
    pub max_retries: Option<u32>,
    /// First retry delay in milliseconds.
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,
    /// Backoff cap in milliseconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_retries: None,
            base_delay_ms: default_base_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_delay() -> u64 {
    1_000
}

fn default_max_delay() -> u64 {
    10_000
}
