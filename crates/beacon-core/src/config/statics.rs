//! Compiled-output static file serving configuration.

use serde::{Deserialize, Serialize};

/// Static file serving settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticConfig {
    /// Whether compiled output is served at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Directory holding the compiled output.
    #[serde(default = "default_directory")]
    pub directory: String,
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: default_directory(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_directory() -> String {
    "dist".to_string()
}
