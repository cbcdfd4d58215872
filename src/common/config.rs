//! Configuration file handling

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::paths::{config_path, explicit_config_path};
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Default validation modes
    #[serde(default)]
    pub defaults: Defaults,

    /// Report output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Distributed cache localization settings
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Validation modes used when a scenario or flag doesn't say otherwise
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Defaults {
    /// Whether outputs must appear in the expected order
    #[serde(default = "default_order_matters")]
    pub order_matters: bool,

    /// Whether actual counters must all be declared as expectations
    #[serde(default)]
    pub strict_counters: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            order_matters: default_order_matters(),
            strict_counters: false,
        }
    }
}

fn default_order_matters() -> bool {
    true
}

/// Report output settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct OutputConfig {
    /// Emit a JSON report instead of text
    #[serde(default)]
    pub json: bool,

    /// Colorize text output
    #[serde(default = "default_color")]
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json: false,
            color: default_color(),
        }
    }
}

fn default_color() -> bool {
    true
}

/// Cache localization settings
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
pub struct CacheConfig {
    /// Directory to create extraction directories under (system temp if unset)
    #[serde(default)]
    pub temp_root: Option<PathBuf>,

    /// Leave extracted archives on disk after the run
    #[serde(default)]
    pub keep_extracted: bool,
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist. A file named by
    /// `MRCHECK_CONFIG` must exist.
    pub fn load() -> Result<Self> {
        if let Some(path) = explicit_config_path() {
            return Self::load_from(&path);
        }
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| super::Error::file_read(path, e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.defaults.order_matters);
        assert!(!config.defaults.strict_counters);
        assert!(config.output.color);
        assert!(config.cache.temp_root.is_none());
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::parse(
            r#"
            [defaults]
            strict_counters = true

            [cache]
            temp_root = "/var/tmp/mrcheck"
            "#,
        )
        .unwrap();
        assert!(config.defaults.order_matters);
        assert!(config.defaults.strict_counters);
        assert_eq!(config.cache.temp_root, Some(PathBuf::from("/var/tmp/mrcheck")));
        assert!(!config.cache.keep_extracted);
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::parse("[defaults\norder_matters = ").unwrap_err();
        assert!(matches!(err, super::super::Error::ConfigParse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[output]\njson = true\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert!(config.output.json);
    }
}
