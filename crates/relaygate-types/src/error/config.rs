//! Configuration loading errors.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Failure to produce a usable `AppConfig`. Each variant names the file or
/// field at fault so startup can report it verbatim.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum ConfigError {
    /// An explicitly requested config file does not exist
    #[error("Config file {path} does not exist")]
    NotFound { path: String },

    #[error("Cannot read {path}: {message}")]
    Unreadable { path: String, message: String },

    /// JSON syntax or shape error, with the 1-based position serde reports
    #[error("Malformed config {path} at line {line}, column {column}: {message}")]
    Malformed { path: String, line: usize, column: usize, message: String },

    /// A value failed a range, url or environment override check
    #[error("Invalid config value for {field}: {message}")]
    Invalid { field: String, message: String },

    #[error("Cannot write {path}: {message}")]
    WriteFailed { path: String, message: String },
}

impl ConfigError {
    pub fn malformed(path: &Path, e: &serde_json::Error) -> Self {
        Self::Malformed {
            path: path.display().to_string(),
            line: e.line(),
            column: e.column(),
            message: e.to_string(),
        }
    }

    pub fn unreadable(path: &Path, e: &std::io::Error) -> Self {
        Self::Unreadable { path: path.display().to_string(), message: e.to_string() }
    }

    pub fn write_failed(path: &Path, message: impl ToString) -> Self {
        Self::WriteFailed { path: path.display().to_string(), message: message.to_string() }
    }
}
