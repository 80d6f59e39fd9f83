//! Error types for GitHub operations.

use thiserror::Error;

/// Errors that can occur talking to GitHub or running git.
#[derive(Debug, Error)]
pub enum GithubError {
    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// GitHub API returned a non-success status.
    #[error("GitHub API error {status}: {body}")]
    Api { status: u16, body: String },

    /// Response body did not match the expected shape.
    #[error("Failed to parse GitHub response: {0}")]
    Parse(String),

    /// A git subprocess exited nonzero.
    #[error("git {command} failed ({status}): {stderr}")]
    Git {
        command: String,
        status: i32,
        stderr: String,
    },

    /// IO error (spawning git, creating directories).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for GithubError {
    fn from(e: reqwest::Error) -> Self {
        GithubError::Http(e.to_string())
    }
}

/// Result type for GitHub operations.
pub type Result<T> = std::result::Result<T, GithubError>;
