//! Coding-agent subprocess invocation.
//!
//! The agent is driven with a single instruction payload and communicates
//! only through its exit code and captured output. Output goes straight to
//! a per-task log file on disk — not an in-memory buffer — so a postmortem
//! survives bot restarts.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::info;

use crate::error::{Result, WorkError};

/// Default coding-agent executable name.
pub const DEFAULT_AGENT_PROGRAM: &str = "claude";

/// Completed agent run: exit code plus the durable log.
#[derive(Debug)]
pub struct AgentRun {
    pub exit_code: i32,
    pub log_path: PathBuf,
    pub output: String,
}

impl AgentRun {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Last `max_chars` characters of the captured output.
    pub fn tail(&self, max_chars: usize) -> &str {
        tail(&self.output, max_chars)
    }
}

/// Locate the coding-agent executable on PATH.
pub fn agent_program() -> Result<PathBuf> {
    which::which(DEFAULT_AGENT_PROGRAM)
        .map_err(|_| WorkError::AgentNotFound(DEFAULT_AGENT_PROGRAM.to_string()))
}

/// Run the coding agent with `payload` in `workdir`, capturing stdout and
/// stderr into `log_path`.
///
/// Permission prompts are suppressed — the agent runs unattended. The call
/// blocks until the agent exits; there is no timeout, so a hung agent
/// occupies the work slot until it terminates.
pub async fn run_agent(
    program: &Path,
    payload: &str,
    workdir: &Path,
    log_path: &Path,
) -> Result<AgentRun> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let log_file = std::fs::File::create(log_path)?;
    let log_stderr = log_file.try_clone()?;

    info!(
        program = %program.display(),
        workdir = %workdir.display(),
        log = %log_path.display(),
        "Starting coding agent"
    );

    let status = Command::new(program)
        .arg("--dangerously-skip-permissions")
        .arg("-p")
        .arg(payload)
        .current_dir(workdir)
        .stdin(Stdio::null())
        .stdout(Stdio::from(log_file))
        .stderr(Stdio::from(log_stderr))
        .status()
        .await?;

    let exit_code = status.code().unwrap_or(-1);
    let output = std::fs::read_to_string(log_path).unwrap_or_default();

    info!(exit_code, log = %log_path.display(), "Coding agent finished");

    Ok(AgentRun {
        exit_code,
        log_path: log_path.to_path_buf(),
        output,
    })
}

/// Last `max_chars` characters of `text`, split on a char boundary.
pub fn tail(text: &str, max_chars: usize) -> &str {
    let count = text.chars().count();
    if count <= max_chars {
        return text;
    }
    let skip = count - max_chars;
    match text.char_indices().nth(skip) {
        Some((byte_index, _)) => &text[byte_index..],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn tail_short_text_unchanged() {
        assert_eq!(tail("hello", 10), "hello");
    }

    #[test]
    fn tail_truncates_from_front() {
        assert_eq!(tail("abcdefgh", 3), "fgh");
    }

    #[test]
    fn tail_respects_char_boundaries() {
        let text = "héllo wörld";
        let tailed = tail(text, 4);
        assert_eq!(tailed, "örld");
    }

    #[tokio::test]
    async fn run_agent_captures_output_and_exit_code() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("logs/task.log");

        // `true` ignores the agent-style arguments and exits 0.
        let run = run_agent(Path::new("true"), "payload", dir.path(), &log_path)
            .await
            .unwrap();

        assert!(run.success());
        assert!(log_path.exists());
    }

    #[tokio::test]
    async fn run_agent_reports_nonzero_exit() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("task.log");

        let run = run_agent(Path::new("false"), "payload", dir.path(), &log_path)
            .await
            .unwrap();

        assert_eq!(run.exit_code, 1);
        assert!(!run.success());
    }
}
