//! Error types for inventory generation.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for inventory operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Inventory generation errors.
///
/// Every variant aborts the run: the inventory is produced completely or not at all.
#[derive(Debug, Error)]
pub enum Error {
    // Configuration
    #[error("Missing required configuration value: {0}")]
    MissingConfig(String),

    #[error("Error parsing configuration: {0}")]
    Config(String),

    #[error("Invalid CIDR: {0}")]
    InvalidCidr(String),

    // Data integrity
    #[error("Group name \"{name}\" (from \"{display_name}\") is not unique!")]
    DuplicateName { name: String, display_name: String },

    #[error("Host address \"{0}\" is not unique!")]
    DuplicateAddress(String),

    #[error("Supernet {0} is part of a parent cycle")]
    SupernetCycle(i64),

    // Transport
    #[error("IPAM request failed: {status} {reason}")]
    Transport { status: u16, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Error parsing {context}: path={path} error={message}")]
    Parse {
        context: String,
        path: String,
        message: String,
    },

    // Files
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
