//! Shared state across command handlers.

use std::sync::{Arc, Mutex, PoisonError};

use forgebot_core::{paths, Config};
use forgebot_github::GithubClient;
use forgebot_triage::TriageBackend;
use forgebot_worker::{agent_runner, WorkContext, WorkCoordinator};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::Result;

/// Shared state behind an `Arc`, one instance per bot process.
pub struct BotState {
    /// Persisted config. Mutated only when the first `/start` claims the
    /// bot, under this lock.
    config: Mutex<Config>,
    pub github: GithubClient,
    pub triage: TriageBackend,
    pub coordinator: WorkCoordinator,
    pub work: WorkContext,
    /// Terminal work results and scheduler notifications land here; the
    /// forwarding loop sends them to the bound chat.
    pub outcome_tx: mpsc::Sender<String>,
}

impl BotState {
    /// Build the shared state from a loaded config.
    pub fn new(config: Config, outcome_tx: mpsc::Sender<String>) -> Result<Arc<Self>> {
        let github = GithubClient::new(config.github_token.clone());
        let triage = TriageBackend::from_config(config.anthropic_api_key.as_deref())?;

        // A missing agent binary only matters once work is submitted; the
        // invocation then fails at the task boundary with a chat-visible
        // message rather than blocking startup.
        let agent_program = agent_runner::agent_program().unwrap_or_else(|e| {
            warn!(error = %e, "Coding agent not found; /work will fail until it is installed");
            std::path::PathBuf::from(agent_runner::DEFAULT_AGENT_PROGRAM)
        });
        let work = WorkContext {
            github: github.clone(),
            triage: triage.clone(),
            workspace_dir: config.workspace_dir.clone(),
            logs_dir: paths::logs_dir(),
            agent_program,
        };

        Ok(Arc::new(Self {
            config: Mutex::new(config),
            github,
            triage,
            coordinator: WorkCoordinator::new(),
            work,
            outcome_tx,
        }))
    }

    fn config(&self) -> std::sync::MutexGuard<'_, Config> {
        self.config.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The bound chat, if one has claimed the bot.
    pub fn bound_chat(&self) -> Option<i64> {
        self.config().chat_id
    }

    /// Whether updates from this chat should be handled at all.
    ///
    /// Before a claim, only `/start` is actionable (handled separately);
    /// after a claim, only the bound chat gets through. Everyone else is
    /// silently ignored.
    pub fn is_bound(&self, chat_id: i64) -> bool {
        self.config().is_bound_chat(chat_id)
    }

    /// Claim the bot for `chat_id` if unclaimed, persisting the config.
    ///
    /// Returns `true` when this call performed the claim.
    pub fn claim_chat(&self, chat_id: i64) -> Result<bool> {
        let mut config = self.config();
        if config.claim_chat(chat_id) {
            config.save()?;
            info!(chat_id, "Chat claim persisted");
            return Ok(true);
        }
        Ok(false)
    }

    /// The configured repo list.
    pub fn repos(&self) -> Vec<String> {
        self.config().repos.clone()
    }

    /// Intervals and other config snapshots for scheduler startup.
    pub fn config_snapshot(&self) -> Config {
        self.config().clone()
    }

    /// Resolve a user-supplied repo argument against the configured list.
    ///
    /// Exact case-insensitive `owner/name` match first, then a suffix
    /// match on `/name`.
    pub fn resolve_repo(&self, arg: &str) -> Option<String> {
        resolve_repo(&self.repos(), arg)
    }

    /// The repos a command with an optional `[repo]` argument targets:
    /// all of them when the argument is omitted.
    pub fn target_repos(&self, arg: &str) -> std::result::Result<Vec<String>, String> {
        let arg = arg.trim();
        if arg.is_empty() {
            return Ok(self.repos());
        }
        match self.resolve_repo(arg) {
            Some(repo) => Ok(vec![repo]),
            None => Err(format!("Repo not found: {arg}. Use /repos to list them.")),
        }
    }
}

/// Resolve `arg` against configured `owner/name` strings.
pub fn resolve_repo(repos: &[String], arg: &str) -> Option<String> {
    let arg = arg.trim();
    if arg.is_empty() {
        return None;
    }
    let lower = arg.to_lowercase();

    if let Some(exact) = repos.iter().find(|r| r.to_lowercase() == lower) {
        return Some(exact.clone());
    }
    repos
        .iter()
        .find(|r| r.to_lowercase().ends_with(&format!("/{lower}")))
        .cloned()
}
