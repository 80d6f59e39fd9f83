//! Error types for work execution.

use thiserror::Error;

/// Errors that can occur while coordinating or running work.
#[derive(Debug, Error)]
pub enum WorkError {
    /// A task is already running; the new one is rejected, not queued.
    #[error("Already working on {current}. Check /status and retry when it finishes.")]
    Busy { current: String },

    /// GitHub or git failure.
    #[error(transparent)]
    Github(#[from] forgebot_github::GithubError),

    /// Triage/LLM failure.
    #[error(transparent)]
    Triage(#[from] forgebot_triage::TriageError),

    /// The coding-agent executable could not be found.
    #[error("Coding agent '{0}' not found on PATH")]
    AgentNotFound(String),

    /// IO error (log files, spawning the agent).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for work operations.
pub type Result<T> = std::result::Result<T, WorkError>;
