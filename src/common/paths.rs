//! Configuration paths
//!
//! Uses the directories crate for platform-appropriate locations:
//! - Linux: `~/.config/mrcheck/`
//! - macOS: `~/Library/Application Support/mrcheck/`
//! - Windows: `%APPDATA%\mrcheck\`

use std::path::PathBuf;

/// Name used for the application directories
const APP_NAME: &str = "mrcheck";

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV: &str = "MRCHECK_CONFIG";

/// Get the path to the configuration file
///
/// `MRCHECK_CONFIG` takes precedence over the platform location.
pub fn config_path() -> Option<PathBuf> {
    explicit_config_path().or_else(|| config_dir().map(|dir| dir.join("config.toml")))
}

/// The configuration file named by `MRCHECK_CONFIG`, if set
pub fn explicit_config_path() -> Option<PathBuf> {
    std::env::var_os(CONFIG_ENV)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
}
