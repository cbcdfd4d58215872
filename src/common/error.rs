//! Error types for mrcheck
//!
//! Validation discrepancies are not errors in this sense; they are collected
//! as records and only surface here, wrapped in [`Error::Validation`], once a
//! run has been judged as failed.

use std::io;
use thiserror::Error;

use crate::validate::ValidationFailure;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for mrcheck
#[derive(Error, Debug)]
pub enum Error {
    // === Validation ===
    #[error("{0}")]
    Validation(#[from] ValidationFailure),

    // === Input Parsing Errors ===
    #[error("String pair missing a tab separator: {0:?}")]
    InvalidPair(String),

    #[error("Malformed counter line: {0:?}. Expected 'reporter:counter:<group>,<name>,<amount>'")]
    InvalidCounterLine(String),

    #[error("Counter {counter} overflows at line {line:?}")]
    CounterOverflow { counter: String, line: String },

    #[error("Failed to parse scenario '{path}': {error}")]
    ScenarioParse { path: String, error: String },

    // === Job Errors ===
    #[error("Job failed: {0}")]
    Job(String),

    // === Distributed Cache Errors ===
    #[error("Unsupported cache archive '{0}'. Supported: .zip, .jar, .tar, .tar.gz, .tgz")]
    UnsupportedArchive(String),

    #[error("Failed to localize cache entry '{path}': {reason}")]
    Localize { path: String, reason: String },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a file read error for a path
    pub fn file_read(path: &std::path::Path, error: impl std::fmt::Display) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// Create a scenario parse error
    pub fn scenario_parse(path: &std::path::Path, error: impl std::fmt::Display) -> Self {
        Self::ScenarioParse {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// Create a cache localization error
    pub fn localize(path: &std::path::Path, reason: impl std::fmt::Display) -> Self {
        Self::Localize {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// The validation failure, when this error is one
    pub fn as_validation(&self) -> Option<&ValidationFailure> {
        match self {
            Self::Validation(failure) => Some(failure),
            _ => None,
        }
    }
}
