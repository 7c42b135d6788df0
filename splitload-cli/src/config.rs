//! CLI log configuration

use tracing::Level;

/// Log levels for the CLI run, globally and per crate
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level applied where no override is set
    pub global: Level,
    /// Override for the manifest crate
    pub manifest: Option<Level>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global: Level::INFO,
            manifest: None,
        }
    }
}

impl LogConfig {
    /// The level a given crate target logs at
    pub fn level_for(&self, target: &str) -> Level {
        match target {
            "splitload_manifest" => self.manifest.unwrap_or(self.global),
            _ => self.global,
        }
    }
}

/// Parse a level name, `None` when unrecognized
pub fn parse_level(name: &str) -> Option<Level> {
    match name.to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_info() {
        let config = LogConfig::default();
        assert_eq!(config.global, Level::INFO);
        assert_eq!(config.level_for("splitload_manifest"), Level::INFO);
        assert_eq!(config.level_for("anything_else"), Level::INFO);
    }

    #[test]
    fn overrides_beat_the_global_level() {
        let config = LogConfig {
            global: Level::WARN,
            manifest: Some(Level::TRACE),
        };
        assert_eq!(config.level_for("splitload_manifest"), Level::TRACE);
        assert_eq!(config.level_for("splitload_cli"), Level::WARN);
    }

    #[test]
    fn parses_level_names() {
        assert_eq!(parse_level("debug"), Some(Level::DEBUG));
        assert_eq!(parse_level("WARN"), Some(Level::WARN));
        assert_eq!(parse_level("loud"), None);
    }
}
