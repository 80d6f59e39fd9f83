//! Bot wiring: dispatcher, notification forwarding, scheduler startup.

use std::sync::Arc;
use std::time::Duration;

use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use teloxide::types::ChatId;
use tokio::sync::mpsc;
use tracing::{info, warn};

use forgebot_core::{paths, Config};
use forgebot_scheduler::ScheduleContext;

use crate::commands::Command;
use crate::error::Result;
use crate::handlers::handle_command;
use crate::state::BotState;

/// Telegram's hard limit on message length.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

/// Buffered outcome/notification messages before senders block.
const OUTCOME_CHANNEL_CAPACITY: usize = 64;

/// The forgebot Telegram bot.
pub struct ForgeBot {
    bot: Bot,
    state: Arc<BotState>,
    outcome_rx: mpsc::Receiver<String>,
}

impl ForgeBot {
    /// Build the bot and its shared state from a loaded config.
    pub fn from_config(config: Config) -> Result<Self> {
        let (outcome_tx, outcome_rx) = mpsc::channel(OUTCOME_CHANNEL_CAPACITY);
        let bot = Bot::new(config.telegram_token.clone());
        let state = BotState::new(config, outcome_tx)?;
        Ok(Self {
            bot,
            state,
            outcome_rx,
        })
    }

    /// Run the bot until the process is stopped.
    ///
    /// Starts the notification forwarding loop and the two periodic jobs,
    /// then blocks on the long-polling dispatcher.
    pub async fn run(self) -> Result<()> {
        let Self {
            bot,
            state,
            mut outcome_rx,
        } = self;

        // Forward worker results and scheduler notifications to the bound
        // chat. Messages arriving before any chat has claimed the bot are
        // dropped — there is nowhere to send them.
        let forward_bot = bot.clone();
        let forward_state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Some(message) = outcome_rx.recv().await {
                match forward_state.bound_chat() {
                    Some(chat_id) => {
                        if let Err(e) = send_chunked(&forward_bot, ChatId(chat_id), &message).await
                        {
                            warn!(chat_id, error = %e, "Failed to deliver notification");
                        }
                    }
                    None => {
                        warn!("Dropping notification, no chat has claimed the bot yet");
                    }
                }
            }
        });

        let config = state.config_snapshot();
        forgebot_scheduler::start(ScheduleContext {
            github: state.github.clone(),
            triage: state.triage.clone(),
            repos: config.repos.clone(),
            check_interval: Duration::from_secs(config.check_interval_hours * 3600),
            suggest_interval: Duration::from_secs(config.suggest_interval_hours * 3600),
            ledger_path: paths::ledger_file(),
            notify: state.outcome_tx.clone(),
        });

        let state_for_commands = Arc::clone(&state);
        let state_for_unknown = Arc::clone(&state);

        let handler = dptree::entry()
            .branch(
                Update::filter_message()
                    .filter_command::<Command>()
                    .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
                        let state = Arc::clone(&state_for_commands);
                        async move { handle_command(bot, msg, cmd, state).await }
                    }),
            )
            .branch(
                // Slash messages that didn't parse as a known command.
                Update::filter_message()
                    .filter(|msg: Message| {
                        msg.text().map(|t| t.starts_with('/')).unwrap_or(false)
                    })
                    .endpoint(move |bot: Bot, msg: Message| {
                        let state = Arc::clone(&state_for_unknown);
                        async move {
                            if !state.is_bound(msg.chat.id.0) {
                                return Ok(());
                            }
                            if let Some(text) = msg.text() {
                                let cmd = text.split_whitespace().next().unwrap_or(text);
                                bot.send_message(
                                    msg.chat.id,
                                    format!("Unknown command: {cmd}\n\nUse /help to see available commands."),
                                )
                                .await?;
                            }
                            Ok(())
                        }
                    }),
            );

        info!("Bot is running. Send /start to claim it.");

        Dispatcher::builder(bot, handler)
            .default_handler(|_| async {})
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        Ok(())
    }
}

/// Send `text` to a chat, splitting it across messages when it exceeds
/// Telegram's length limit.
pub async fn send_chunked(bot: &Bot, chat_id: ChatId, text: &str) -> ResponseResult<()> {
    for chunk in split_message(text, TELEGRAM_MESSAGE_LIMIT) {
        bot.send_message(chat_id, chunk).await?;
    }
    Ok(())
}

/// Split `text` into chunks of at most `limit` characters, preferring to
/// break on line boundaries.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut rest = text;

    while rest.chars().count() > limit {
        let boundary = rest
            .char_indices()
            .nth(limit)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let window = &rest[..boundary];
        let split_at = window.rfind('\n').map(|i| i + 1).unwrap_or(boundary);
        let (chunk, tail) = rest.split_at(split_at);
        let chunk = chunk.trim_end_matches('\n');
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }
        rest = tail;
    }

    if !rest.is_empty() {
        chunks.push(rest.to_string());
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_message_is_one_chunk() {
        assert_eq!(split_message("hello", 100), vec!["hello"]);
    }

    #[test]
    fn empty_message_is_no_chunks() {
        assert!(split_message("", 100).is_empty());
    }

    #[test]
    fn long_message_splits_on_newlines() {
        let text = "aaaa\nbbbb\ncccc";
        let chunks = split_message(text, 10);
        assert_eq!(chunks, vec!["aaaa\nbbbb", "cccc"]);
    }

    #[test]
    fn unbroken_text_hard_splits_at_limit() {
        let text = "a".repeat(25);
        let chunks = split_message(&text, 10);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn split_respects_char_boundaries() {
        let text = "ä".repeat(15);
        let chunks = split_message(&text, 10);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks.concat(), text);
    }
}
