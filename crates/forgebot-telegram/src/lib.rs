//! Telegram front-end for forgebot.
//!
//! Dispatches chat commands to the GitHub, triage, and worker crates, and
//! forwards worker/scheduler notifications to the single bound chat. The
//! bound chat is claimed by the first `/start` and is the entire
//! authorization model — updates from any other chat are silently dropped.

pub mod bot;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;

pub use bot::ForgeBot;
pub use commands::Command;
pub use error::{BotError, Result};
pub use state::BotState;
