//! Error types for the Telegram front-end.

use thiserror::Error;

/// Errors that can occur wiring up or running the bot.
#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Core(#[from] forgebot_core::CoreError),

    #[error(transparent)]
    Triage(#[from] forgebot_triage::TriageError),

    #[error(transparent)]
    Work(#[from] forgebot_worker::WorkError),

    /// Telegram API failure.
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// IO error during setup.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for bot operations.
pub type Result<T> = std::result::Result<T, BotError>;
