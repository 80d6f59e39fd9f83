//! Error types for scheduled jobs.

use thiserror::Error;

/// Errors that can abort a job cycle.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Core(#[from] forgebot_core::CoreError),

    #[error(transparent)]
    Github(#[from] forgebot_github::GithubError),

    #[error(transparent)]
    Triage(#[from] forgebot_triage::TriageError),

    /// The notification channel closed — the bot is shutting down.
    #[error("Notification channel closed")]
    ChannelClosed,
}

/// Result type for scheduler operations.
pub type Result<T> = std::result::Result<T, SchedulerError>;
