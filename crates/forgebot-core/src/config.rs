//! Persisted configuration.
//!
//! The config is written once by `forgebot setup` and mutated at most once
//! afterwards, when the first authorized `/start` claims the bot for a chat.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::atomic::{atomic_write_json, read_json};
use crate::error::{CoreError, Result};
use crate::paths;

/// Default interval between new-issue checks.
pub const DEFAULT_CHECK_INTERVAL_HOURS: u64 = 6;

/// Default interval between proactive suggestions.
pub const DEFAULT_SUGGEST_INTERVAL_HOURS: u64 = 24;

fn default_check_interval() -> u64 {
    DEFAULT_CHECK_INTERVAL_HOURS
}

fn default_suggest_interval() -> u64 {
    DEFAULT_SUGGEST_INTERVAL_HOURS
}

fn default_workspace_dir() -> PathBuf {
    paths::default_workspace_dir()
}

/// Process-wide settings, loaded once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Telegram bot token.
    pub telegram_token: String,

    /// GitHub personal access token, used for the API and git pushes.
    pub github_token: String,

    /// Repositories to watch, as `owner/name`. Non-empty after setup.
    pub repos: Vec<String>,

    /// Anthropic API key. Absent ⇒ fall back to the local agent CLI for
    /// triage calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anthropic_api_key: Option<String>,

    /// The single chat the bot answers to. Claimed by the first /start and
    /// never overwritten afterwards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<i64>,

    /// Hours between new-issue checks.
    #[serde(default = "default_check_interval")]
    pub check_interval_hours: u64,

    /// Hours between proactive work suggestions.
    #[serde(default = "default_suggest_interval")]
    pub suggest_interval_hours: u64,

    /// Base directory for cloned repositories.
    #[serde(default = "default_workspace_dir")]
    pub workspace_dir: PathBuf,
}

impl Config {
    /// Create a config with defaults for everything beyond the required
    /// tokens and repo list.
    pub fn new(telegram_token: String, github_token: String, repos: Vec<String>) -> Self {
        Self {
            telegram_token,
            github_token,
            repos,
            anthropic_api_key: None,
            chat_id: None,
            check_interval_hours: DEFAULT_CHECK_INTERVAL_HOURS,
            suggest_interval_hours: DEFAULT_SUGGEST_INTERVAL_HOURS,
            workspace_dir: paths::default_workspace_dir(),
        }
    }

    /// Load the config from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_file())
    }

    /// Load the config from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigMissing(path.to_path_buf()));
        }
        let config: Config = read_json(path).map_err(|e| match e {
            CoreError::Json(e) => CoreError::ConfigInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
            other => other,
        })?;
        config.validate(path)?;
        Ok(config)
    }

    /// Persist the config to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&paths::config_file())
    }

    /// Persist the config to an explicit path, atomically.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        atomic_write_json(path, self)
    }

    /// Bind the bot to a chat if no chat has claimed it yet.
    ///
    /// Returns `true` if this call performed the claim. A repeat claim by
    /// the same chat is a no-op returning `false`; a claim attempt by a
    /// different chat is ignored.
    pub fn claim_chat(&mut self, chat_id: i64) -> bool {
        match self.chat_id {
            None => {
                self.chat_id = Some(chat_id);
                info!(chat_id, "Bot claimed by chat");
                true
            }
            Some(_) => false,
        }
    }

    /// Whether the given chat is the bound chat.
    pub fn is_bound_chat(&self, chat_id: i64) -> bool {
        self.chat_id == Some(chat_id)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.repos.is_empty() {
            return Err(CoreError::ConfigInvalid {
                path: path.to_path_buf(),
                reason: "repos must not be empty".to_string(),
            });
        }
        if self.check_interval_hours == 0 || self.suggest_interval_hours == 0 {
            return Err(CoreError::ConfigInvalid {
                path: path.to_path_buf(),
                reason: "intervals must be positive".to_string(),
            });
        }
        Ok(())
    }
}
