//! Build statistics reported by the compiler collaborator.

use serde::{Deserialize, Serialize};

/// Structured summary of one completed build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    /// Content hash of the build.
    pub hash: String,
    /// Formatted error messages.
    #[serde(default)]
    pub errors: Vec<String>,
    /// Formatted warning messages.
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Per-asset emission flags.
    #[serde(default)]
    pub assets: Vec<AssetStat>,
}

/// One output asset of a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetStat {
    /// Asset file name.
    pub name: String,
    /// Whether the asset was actually (re)written this build.
    pub emitted: bool,
}

impl BuildStats {
    /// Whether the build produced errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Whether the build produced warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Whether any asset was actually written to disk this build.
    pub fn assets_emitted(&self) -> bool {
        self.assets.iter().any(|a| a.emitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str, emitted: bool) -> AssetStat {
        AssetStat {
            name: name.to_string(),
            emitted,
        }
    }

    #[test]
    fn assets_emitted_requires_at_least_one_emitted_asset() {
        let mut stats = BuildStats {
            hash: "abc".into(),
            errors: vec![],
            warnings: vec![],
            assets: vec![asset("main.js", false), asset("main.css", false)],
        };
        assert!(!stats.assets_emitted());

        stats.assets.push(asset("vendor.js", true));
        assert!(stats.assets_emitted());
    }
}
