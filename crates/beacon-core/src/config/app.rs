//! HTTP server and host-validation configuration.

use serde::{Deserialize, Serialize};

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public hostname clients are expected to use (e.g. behind a tunnel).
    /// Always accepted by host validation in addition to the computed set.
    #[serde(default)]
    pub public_host: Option<String>,
    /// Host/Origin validation policy for HTTP requests and upgrades.
    #[serde(default)]
    pub allowed_hosts: AllowedHosts,
    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_seconds: u64,
    /// Allowed CORS origins (use `["*"]` for development only).
    #[serde(default = "default_allowed_origins")]
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_host: None,
            allowed_hosts: AllowedHosts::default(),
            shutdown_grace_seconds: default_shutdown_grace(),
            cors_allowed_origins: default_allowed_origins(),
        }
    }
}

/// Host-validation policy.
///
/// Deserializes from `"auto"`, `"all"`, or an explicit list of host names.
/// A list entry starting with a dot (`".example.com"`) matches any
/// subdomain of that domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AllowedHosts {
    /// `"auto"` or `"all"`.
    Mode(AllowedHostsMode),
    /// Explicit host list.
    List(Vec<String>),
}

/// The two keyword modes of [`AllowedHosts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllowedHostsMode {
    /// Allow loopback names, IP literals, and the configured public host.
    Auto,
    /// Disable host validation entirely.
    All,
}

impl Default for AllowedHosts {
    fn default() -> Self {
        Self::Mode(AllowedHostsMode::Auto)
    }
}

impl AllowedHosts {
    /// Whether `hostname` (no port) passes this policy.
    ///
    /// Loopback names and IP literals are always accepted: a development
    /// server must stay reachable from the machine it runs on.
    pub fn permits(&self, hostname: &str, public_host: Option<&str>) -> bool {
        if is_loopback_or_ip(hostname) {
            return true;
        }
        if let Some(public) = public_host {
            if hostname.eq_ignore_ascii_case(public) {
                return true;
            }
        }
        match self {
            Self::Mode(AllowedHostsMode::All) => true,
            Self::Mode(AllowedHostsMode::Auto) => {
                hostname == "localhost" || hostname.ends_with(".localhost")
            }
            Self::List(entries) => entries.iter().any(|entry| {
                if let Some(domain) = entry.strip_prefix('.') {
                    hostname == domain || hostname.ends_with(entry.as_str())
                } else {
                    hostname.eq_ignore_ascii_case(entry)
                }
            }),
        }
    }
}

/// Loopback names, IPv4 literals, and bracketed IPv6 literals.
fn is_loopback_or_ip(hostname: &str) -> bool {
    if hostname == "localhost" || hostname.ends_with(".localhost") {
        return true;
    }
    if let Some(v6) = hostname.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
        return v6.parse::<std::net::Ipv6Addr>().is_ok();
    }
    hostname.parse::<std::net::IpAddr>().is_ok()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_shutdown_grace() -> u64 {
    30
}

fn default_allowed_origins() -> Vec<String> {
    vec!["*".to_string()]
}
