//! The three work operations: fix an issue, address PR comments, review a
//! codebase.
//!
//! Each operation returns a single terminal result string. Agent failures
//! (nonzero exit) are results, not errors — the branch is left unpushed
//! and the message carries the exit code, log location, and output tail.
//! Errors are reserved for infrastructure failures (git, API, IO).

use std::path::PathBuf;

use forgebot_core::paths;
use forgebot_github::{git, GithubClient, Issue, PrComment, PullRequest};
use forgebot_triage::TriageBackend;
use tracing::info;

use crate::agent_runner::run_agent;
use crate::error::Result;

/// Output tail included in failure messages.
const FAILURE_TAIL_CHARS: usize = 2000;

/// Output tail used as the PR change summary.
const SUMMARY_TAIL_CHARS: usize = 3000;

/// Everything an operation needs: collaborator clients plus the workspace
/// and log locations.
#[derive(Clone)]
pub struct WorkContext {
    pub github: GithubClient,
    pub triage: TriageBackend,
    pub workspace_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub agent_program: PathBuf,
}

impl WorkContext {
    fn repo_path(&self, repo: &str) -> PathBuf {
        self.workspace_dir.join(repo)
    }

    /// Clone or fast-forward `repo` and return its local path and default
    /// branch.
    async fn prepare_clone(&self, repo: &str) -> Result<(PathBuf, String)> {
        let default_branch = self.github.default_branch(repo).await?;
        let path = self.repo_path(repo);
        git::clone_or_update(repo, self.github.token(), &path, &default_branch).await?;
        Ok((path, default_branch))
    }

    /// Fix an issue: branch, run the agent, push, open (or reuse) a PR.
    pub async fn fix_issue(
        &self,
        repo: &str,
        issue: &Issue,
        instructions: Option<&str>,
    ) -> Result<String> {
        let (path, default_branch) = self.prepare_clone(repo).await?;
        let branch = format!("issue-{}", issue.number);
        git::create_branch(&path, &branch, &default_branch).await?;

        let payload = issue_payload(issue, &branch, instructions);
        let log_path = paths::task_log_file(&self.logs_dir, repo, &branch);
        let run = run_agent(&self.agent_program, &payload, &path, &log_path).await?;

        if !run.success() {
            // Nothing is pushed and no PR is opened on a failed run.
            return Ok(failure_message(&run));
        }

        git::push_branch(&path, &branch).await?;

        let summary = match run.tail(SUMMARY_TAIL_CHARS).trim() {
            "" => "No output captured.",
            tail => tail,
        };
        let issue_excerpt: String = issue.body_text().chars().take(500).collect();
        let pr_body = format!(
            "Closes #{}\n\n## Issue\n\n**{}**\n\n{}\n\n## Changes\n\n{}\n\n---\nAutomated by forgebot.",
            issue.number, issue.title, issue_excerpt, summary
        );
        let pr_url = self
            .github
            .create_pr(
                repo,
                &format!("Fix #{}: {}", issue.number, issue.title),
                &pr_body,
                &branch,
            )
            .await?;

        info!(repo, issue = issue.number, url = %pr_url, "Issue fix complete");
        Ok(format!("Done! PR created: {pr_url}"))
    }

    /// Address review comments on an existing PR branch and push.
    ///
    /// When the PR has no comments and the user gave no instructions,
    /// there is nothing to address — the agent produces a review of the PR
    /// instead of an empty work run.
    pub async fn address_pr(
        &self,
        repo: &str,
        pr: &PullRequest,
        comments: &[PrComment],
        instructions: Option<&str>,
    ) -> Result<String> {
        let (path, _default_branch) = self.prepare_clone(repo).await?;
        let branch = pr.branch().to_string();
        git::checkout_pr_branch(&path, &branch).await?;

        if comments.is_empty() && instructions.is_none() {
            let review = self.triage.review_pr(pr, comments, &path).await?;
            return Ok(format!("Review of PR #{}:\n\n{review}", pr.number));
        }

        let payload = pr_payload(pr, comments, &branch, instructions);
        let log_path = paths::task_log_file(&self.logs_dir, repo, &format!("pr-{}", pr.number));
        let run = run_agent(&self.agent_program, &payload, &path, &log_path).await?;

        if !run.success() {
            return Ok(failure_message(&run));
        }

        git::push_branch(&path, &branch).await?;

        info!(repo, pr = pr.number, "PR comments addressed");
        Ok(format!(
            "Done! Pushed changes to branch '{branch}' for PR #{}.",
            pr.number
        ))
    }

    /// Review a repo's codebase and file new issues for the suggestions.
    pub async fn review_codebase(&self, repo: &str) -> Result<String> {
        let (path, _default_branch) = self.prepare_clone(repo).await?;

        let existing_titles: Vec<String> = self
            .github
            .list_issues(repo, false)
            .await?
            .into_iter()
            .map(|i| i.title)
            .collect();

        let suggestions = self.triage.review_codebase(&path, &existing_titles).await?;
        if suggestions.is_empty() {
            return Ok(format!("Codebase review of {repo} found nothing new to suggest."));
        }

        let mut lines = vec![format!("Codebase review of {repo} filed {} issue(s):", suggestions.len())];
        for suggestion in &suggestions {
            let url = self
                .github
                .create_issue(repo, &suggestion.title, &suggestion.body)
                .await?;
            lines.push(format!("- {}: {url}", suggestion.title));
        }
        Ok(lines.join("\n"))
    }
}

/// Terminal result for a failed agent run: exit code, durable log
/// location, and the tail of the output.
fn failure_message(run: &crate::agent_runner::AgentRun) -> String {
    format!(
        "Coding agent exited with code {}\nLog: {}\n{}",
        run.exit_code,
        run.log_path.display(),
        run.tail(FAILURE_TAIL_CHARS)
    )
}

/// Instruction payload for fixing an issue.
fn issue_payload(issue: &Issue, branch: &str, instructions: Option<&str>) -> String {
    let mut payload = format!(
        "Work on this GitHub issue.\n\n\
         Issue #{}: {}\n\n{}\n",
        issue.number,
        issue.title,
        issue.body_text()
    );

    if let Some(instructions) = instructions {
        payload.push_str(&format!(
            "\nAdditional instructions from the developer:\n{instructions}\n"
        ));
    }

    payload.push_str(&format!(
        "\nSteps:\n\
         1. Read the project's CLAUDE.md and .github/workflows/ to understand the full CI pipeline (build, test, lint, audit, etc.).\n\
         2. Make the changes to fix the issue.\n\
         3. Run every check from the CI pipeline. Fix all failures.\n\
         4. Merge the latest mainline: git fetch origin && git merge origin/HEAD --no-edit\n\
         5. Run the build and tests again after the merge. Fix any issues.\n\
         6. Commit and push the branch '{branch}'."
    ));
    payload
}

/// Instruction payload for addressing PR review comments.
fn pr_payload(
    pr: &PullRequest,
    comments: &[PrComment],
    branch: &str,
    instructions: Option<&str>,
) -> String {
    let comments_text: String = comments
        .iter()
        .map(|c| format!("- {}\n", c.render()))
        .collect();

    let mut payload = format!(
        "Address the review comments on this pull request.\n\n\
         PR #{}: {}\n\n{}\n\n\
         Review comments to address:\n{comments_text}",
        pr.number,
        pr.title,
        pr.body_text()
    );

    if let Some(instructions) = instructions {
        payload.push_str(&format!(
            "\nAdditional instructions from the developer:\n{instructions}\n"
        ));
    }

    payload.push_str(&format!(
        "\nSteps:\n\
         1. Read the project's CLAUDE.md and .github/workflows/ to understand the full CI pipeline.\n\
         2. Address all review comments listed above.\n\
         3. Run every check from the CI pipeline. Fix all failures.\n\
         4. Commit and push to branch '{branch}'."
    ));
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(number: u64, title: &str, body: &str) -> Issue {
        serde_json::from_value(serde_json::json!({
            "number": number,
            "title": title,
            "body": body,
            "created_at": "2024-01-01T00:00:00Z",
        }))
        .unwrap()
    }

    fn pr(number: u64, branch: &str) -> PullRequest {
        serde_json::from_value(serde_json::json!({
            "number": number,
            "title": "Fix things",
            "body": "PR body",
            "head": {"ref": branch},
            "html_url": format!("https://github.com/owner/repo/pull/{number}"),
        }))
        .unwrap()
    }

    #[test]
    fn failure_message_carries_exit_code_log_and_tail() {
        let run = crate::agent_runner::AgentRun {
            exit_code: 2,
            log_path: std::path::PathBuf::from("/logs/owner_repo/issue-7.log"),
            output: format!("{}THE TAIL", "x".repeat(3000)),
        };
        let message = failure_message(&run);
        assert!(message.contains("exited with code 2"));
        assert!(message.contains("/logs/owner_repo/issue-7.log"));
        assert!(message.ends_with("THE TAIL"));
        // Only the tail of a long output is included.
        assert!(!message.contains(&"x".repeat(2500)));
    }

    #[test]
    fn issue_payload_contains_checklist_and_branch() {
        let payload = issue_payload(&issue(7, "Crash", "It crashes."), "issue-7", None);
        assert!(payload.contains("Issue #7: Crash"));
        assert!(payload.contains("It crashes."));
        assert!(payload.contains("CI pipeline"));
        assert!(payload.contains("push the branch 'issue-7'"));
        assert!(!payload.contains("Additional instructions"));
    }

    #[test]
    fn issue_payload_includes_user_instructions() {
        let payload = issue_payload(
            &issue(7, "Crash", ""),
            "issue-7",
            Some("prefer a minimal fix"),
        );
        assert!(payload.contains("Additional instructions from the developer:\nprefer a minimal fix"));
    }

    #[test]
    fn pr_payload_renders_comments() {
        let comments: Vec<PrComment> = serde_json::from_value(serde_json::json!([
            {"user": {"login": "alice"}, "body": "rename this", "path": "src/lib.rs", "line": 42},
            {"user": {"login": "bob"}, "body": "please add a test"}
        ]))
        .unwrap();

        let payload = pr_payload(&pr(12, "issue-5"), &comments, "issue-5", Some("keep API stable"));
        assert!(payload.contains("PR #12"));
        assert!(payload.contains("- [src/lib.rs:42] @alice: rename this"));
        assert!(payload.contains("- @bob: please add a test"));
        assert!(payload.contains("keep API stable"));
        assert!(payload.contains("push to branch 'issue-5'"));
    }
}
