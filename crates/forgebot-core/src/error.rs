//! Error types for core state handling.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or persisting core state.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Config file is missing entirely.
    #[error("No config found at {0}. Run `forgebot setup` first.")]
    ConfigMissing(PathBuf),

    /// Config file exists but does not parse or fails validation.
    #[error("Invalid config at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    /// A read from disk failed.
    #[error("Failed to read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A write to disk failed.
    #[error("Failed to write {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
