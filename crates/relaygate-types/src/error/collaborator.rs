//! Errors reported by external collaborators (stores, ledger, OAuth).

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum CollaboratorError {
    /// Filesystem failure
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Stored data could not be (de)serialized
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Transport or unexpected HTTP failure, worth retrying later
    #[error("HTTP error: {message}")]
    Http { message: String },

    /// The remote side permanently rejected the request (e.g. invalid_grant)
    #[error("Rejected: {message}")]
    Rejected { message: String },
}

impl CollaboratorError {
    /// True when the failure will not go away by retrying.
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

impl From<std::io::Error> for CollaboratorError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_json::Error> for CollaboratorError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization { message: e.to_string() }
    }
}
