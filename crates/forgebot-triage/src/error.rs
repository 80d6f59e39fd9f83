//! Error types for triage operations.

use thiserror::Error;

/// Errors that can occur during LLM triage.
#[derive(Debug, Error)]
pub enum TriageError {
    /// HTTP transport failure talking to the hosted API.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The hosted API returned a non-success status.
    #[error("LLM API error {status}: {body}")]
    Api { status: u16, body: String },

    /// The local agent CLI could not be found.
    #[error("Agent CLI '{0}' not found on PATH")]
    CliNotFound(String),

    /// The local agent CLI exited nonzero.
    #[error("Agent CLI exited with code {status}: {stderr}")]
    CliFailed { status: i32, stderr: String },

    /// The LLM response violated the triage contract (not valid JSON,
    /// missing keys, or mismatched issue numbers).
    #[error("Triage contract violation: {0}")]
    Contract(String),

    /// IO error spawning the CLI.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for TriageError {
    fn from(e: reqwest::Error) -> Self {
        TriageError::Http(e.to_string())
    }
}

/// Result type for triage operations.
pub type Result<T> = std::result::Result<T, TriageError>;
