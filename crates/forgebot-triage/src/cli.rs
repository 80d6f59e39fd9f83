//! Local agent CLI backend.
//!
//! When no API key is configured, triage prompts run through the same
//! coding-agent CLI the worker uses, in one-shot print mode. The CLI
//! communicates only via stdout and its exit code.

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, TriageError};

/// Default agent executable name.
pub const DEFAULT_AGENT_PROGRAM: &str = "claude";

/// Runs triage prompts through the local agent CLI.
#[derive(Clone)]
pub struct AgentCliClient {
    program: PathBuf,
}

impl AgentCliClient {
    /// Locate the default agent executable on PATH.
    pub fn from_path() -> Result<Self> {
        let program = which::which(DEFAULT_AGENT_PROGRAM)
            .map_err(|_| TriageError::CliNotFound(DEFAULT_AGENT_PROGRAM.to_string()))?;
        Ok(Self { program })
    }

    /// Use an explicit executable (used in tests).
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run a one-shot prompt, returning captured stdout.
    ///
    /// The system prompt, when present, is prepended to the user prompt —
    /// the print-mode CLI takes a single instruction string.
    pub async fn complete(
        &self,
        system: Option<&str>,
        prompt: &str,
        cwd: Option<&Path>,
    ) -> Result<String> {
        let full_prompt = match system {
            Some(system) => format!("{system}\n\n{prompt}"),
            None => prompt.to_string(),
        };

        let mut command = Command::new(&self.program);
        command.arg("-p").arg(&full_prompt);
        if let Some(cwd) = cwd {
            command.current_dir(cwd);
        }

        debug!(program = %self.program.display(), "Agent CLI triage call");
        let output = command.output().await?;

        if !output.status.success() {
            return Err(TriageError::CliFailed {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
