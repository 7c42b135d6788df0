//! Splitload Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic and no global state.
//! It is the shared configuration vocabulary for the runtime and build-time
//! crates.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Signal timing for one deferred unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitConfig {
    /// Milliseconds before the `past_delay` signal fires. Zero raises the
    /// signal immediately without arming a timer, `None` disables it.
    pub delay_ms: Option<u64>,
    /// Milliseconds before the `timed_out` signal fires. `None` disables it.
    pub timeout_ms: Option<u64>,
}

impl Default for UnitConfig {
    fn default() -> Self {
        Self {
            delay_ms: Some(200),
            timeout_ms: None,
        }
    }
}

impl UnitConfig {
    /// The configured delay as a `Duration`
    pub fn delay(&self) -> Option<Duration> {
        self.delay_ms.map(Duration::from_millis)
    }

    /// The configured timeout as a `Duration`
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// How module references are resolved at render time.
///
/// Chosen once per process: a pre-rendering server resolves modules by
/// source path, a live client resolves them by weak numeric id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionStrategy {
    /// Resolve already-loaded modules by source path
    ServerPath,
    /// Resolve already-loaded modules by weak numeric id
    ClientId,
}

impl ResolutionStrategy {
    /// Get the string name of the strategy
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionStrategy::ServerPath => "server-path",
            ResolutionStrategy::ClientId => "client-id",
        }
    }
}

/// Configuration for the manifest build step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    /// File name the manifest is written under
    pub filename: String,
    /// Whether to compute a sub-resource integrity digest per output file
    pub integrity: bool,
    /// Digest algorithms used when `integrity` is enabled
    pub integrity_algorithms: Vec<String>,
    /// Manifest property name the digest is stored under
    pub integrity_property_name: String,
    /// Chunk names excluded from the manifest. Each entry is matched as a
    /// whole-name regular expression, falling back to an exact string
    /// comparison when it does not parse as one.
    pub ignore_chunk_names: Vec<String>,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            filename: String::from("splitload-manifest.json"),
            integrity: false,
            integrity_algorithms: vec![String::from("sha384")],
            integrity_property_name: String::from("integrity"),
            ignore_chunk_names: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_config_defaults() {
        let config = UnitConfig::default();
        assert_eq!(config.delay_ms, Some(200));
        assert_eq!(config.timeout_ms, None);
        assert_eq!(config.delay(), Some(Duration::from_millis(200)));
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn unit_config_durations() {
        let config = UnitConfig {
            delay_ms: Some(0),
            timeout_ms: Some(10_000),
        };
        assert_eq!(config.delay(), Some(Duration::ZERO));
        assert_eq!(config.timeout(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn unit_config_deserialize_fills_defaults() {
        let config: UnitConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, UnitConfig::default());

        let config: UnitConfig = serde_json::from_str(r#"{"delay_ms": null}"#).unwrap();
        assert_eq!(config.delay_ms, None);
    }

    #[test]
    fn strategy_names() {
        assert_eq!(ResolutionStrategy::ServerPath.as_str(), "server-path");
        assert_eq!(ResolutionStrategy::ClientId.as_str(), "client-id");
    }

    #[test]
    fn strategy_serializes_kebab_case() {
        let json = serde_json::to_string(&ResolutionStrategy::ServerPath).unwrap();
        assert_eq!(json, r#""server-path""#);
        let parsed: ResolutionStrategy = serde_json::from_str(r#""client-id""#).unwrap();
        assert_eq!(parsed, ResolutionStrategy::ClientId);
    }

    #[test]
    fn manifest_config_defaults() {
        let config = ManifestConfig::default();
        assert_eq!(config.filename, "splitload-manifest.json");
        assert!(!config.integrity);
        assert_eq!(config.integrity_algorithms, vec!["sha384"]);
        assert_eq!(config.integrity_property_name, "integrity");
        assert!(config.ignore_chunk_names.is_empty());
    }

    #[test]
    fn manifest_config_partial_deserialize() {
        let json = r#"{"filename": "assets.json", "integrity": true}"#;
        let config: ManifestConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.filename, "assets.json");
        assert!(config.integrity);
        assert_eq!(config.integrity_algorithms, vec!["sha384"]);
    }
}
