//! Filesystem layout for forgebot state.
//!
//! All application data is stored under `~/.forgebot/`:
//!
//! ```text
//! ~/.forgebot/
//! ├── config.json     # Persisted configuration
//! ├── state/          # Runtime state (known-issue ledger)
//! ├── logs/           # Durable coding-agent logs, one file per task
//! └── workspace/      # Cloned repositories, one subdir per owner/name
//! ```
//!
//! # Environment Variables
//!
//! - `FORGEBOT_STATE_DIR`: Override the base state directory

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Environment variable for a custom state directory.
pub const STATE_DIR_ENV: &str = "FORGEBOT_STATE_DIR";

/// Default state directory name under home.
const DEFAULT_STATE_DIR: &str = ".forgebot";

const STATE_SUBDIR: &str = "state";
const LOGS_SUBDIR: &str = "logs";
const WORKSPACE_SUBDIR: &str = "workspace";

static STATE_DIR_CACHE: OnceLock<PathBuf> = OnceLock::new();

/// Get the forgebot state directory.
///
/// Determined by:
/// 1. `FORGEBOT_STATE_DIR` environment variable if set
/// 2. `~/.forgebot` if a home directory is available
/// 3. `.forgebot` in the current directory as fallback
pub fn state_dir() -> PathBuf {
    STATE_DIR_CACHE
        .get_or_init(|| {
            std::env::var(STATE_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    dirs::home_dir()
                        .map(|h| h.join(DEFAULT_STATE_DIR))
                        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
                })
        })
        .clone()
}

/// Get the config file path.
pub fn config_file() -> PathBuf {
    state_dir().join("config.json")
}

/// Get the runtime state directory.
pub fn runtime_state_dir() -> PathBuf {
    state_dir().join(STATE_SUBDIR)
}

/// Get the known-issue ledger file path.
pub fn ledger_file() -> PathBuf {
    runtime_state_dir().join("known_issues.json")
}

/// Get the coding-agent logs directory.
pub fn logs_dir() -> PathBuf {
    state_dir().join(LOGS_SUBDIR)
}

/// Get the default workspace directory for cloned repos.
pub fn default_workspace_dir() -> PathBuf {
    state_dir().join(WORKSPACE_SUBDIR)
}

/// Log file path for a given repo and task label, e.g. `issue-42`.
///
/// The repo's `/` is flattened so each repo gets one directory under
/// `logs/`.
pub fn task_log_file(logs_dir: &Path, repo: &str, task: &str) -> PathBuf {
    logs_dir.join(repo.replace('/', "_")).join(format!("{task}.log"))
}

/// Ensure the state directory and all subdirectories exist.
pub fn ensure_all_dirs() -> std::io::Result<()> {
    std::fs::create_dir_all(state_dir())?;
    std::fs::create_dir_all(runtime_state_dir())?;
    std::fs::create_dir_all(logs_dir())?;
    std::fs::create_dir_all(default_workspace_dir())?;
    Ok(())
}
