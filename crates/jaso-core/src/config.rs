//! Tuning configuration loaded from an optional TOML file.
//!
//! Nothing here is ever written back to disk, and the watched directory is
//! deliberately not part of it: each session picks its directory fresh.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Top-level configuration.
///
/// All fields have defaults so jaso works without a config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Loads configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if the file does not exist.
    /// - [`CoreError::PermissionDenied`] if the file is not readable.
    /// - [`CoreError::ConfigParse`] if the TOML is malformed.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| CoreError::from_io(path, e))?;
        toml::from_str(&content).map_err(|e| CoreError::ConfigParse(e.to_string()))
    }
}

/// Watch session tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Quiet period used to coalesce bursts of notifications before walking.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Entry names that are never renamed nor descended into.
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl WatchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            exclude: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    200
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.watch.debounce_ms, 200);
        assert_eq!(config.watch.debounce(), Duration::from_millis(200));
        assert!(config.watch.exclude.is_empty());
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_toml_overrides() {
        let config: Config = toml::from_str(
            r#"
            [watch]
            debounce_ms = 50
            exclude = [".git", "node_modules"]
            "#,
        )
        .unwrap();
        assert_eq!(config.watch.debounce_ms, 50);
        assert_eq!(config.watch.exclude, vec![".git", "node_modules"]);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("jaso.toml");
        fs::write(&path, "[log]\nlevel = \"debug\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.watch, WatchConfig::default());
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = Config::load(&tmp.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn load_malformed_is_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.toml");
        fs::write(&path, "[watch\ndebounce_ms = ").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, CoreError::ConfigParse(_)));
    }
}
