//! The proactive suggestion cycle.
//!
//! Fetches and triages open issues across all repos, then asks the LLM
//! which one to tackle next. Per-repo failures are reported and skipped so
//! one broken repo cannot silence suggestions for the rest.

use forgebot_github::GithubClient;
use forgebot_triage::{AnalyzedIssue, TriageBackend};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::{Result, SchedulerError};

/// Run one suggestion cycle over all configured repos.
pub async fn run_suggest_cycle(
    github: &GithubClient,
    triage: &TriageBackend,
    repos: &[String],
    notify: &mpsc::Sender<String>,
) -> Result<()> {
    let mut all_analyzed: Vec<AnalyzedIssue> = Vec::new();

    for repo in repos {
        match analyze_repo(github, triage, repo).await {
            Ok(analyzed) => all_analyzed.extend(analyzed),
            Err(e) => {
                warn!(repo, error = %e, "Suggestion cycle: repo skipped");
                notify
                    .send(format!("Could not analyze {repo} for suggestions: {e}"))
                    .await
                    .map_err(|_| SchedulerError::ChannelClosed)?;
            }
        }
    }

    if all_analyzed.is_empty() {
        notify
            .send("No open issues to suggest.".to_string())
            .await
            .map_err(|_| SchedulerError::ChannelClosed)?;
        return Ok(());
    }

    info!(count = all_analyzed.len(), "Requesting work suggestion");
    let suggestion = triage.suggest_next(&all_analyzed).await?;
    notify
        .send(format!("Work suggestion:\n\n{suggestion}"))
        .await
        .map_err(|_| SchedulerError::ChannelClosed)?;

    Ok(())
}

/// Fetch and triage one repo's issues, tagging each result with the repo.
async fn analyze_repo(
    github: &GithubClient,
    triage: &TriageBackend,
    repo: &str,
) -> Result<Vec<AnalyzedIssue>> {
    let issues = github.list_issues(repo, false).await?;
    let prs = github.list_prs(repo).await?;
    let mut analyzed = triage.analyze(&issues, Some(&prs)).await?;
    for issue in &mut analyzed {
        issue.repo = Some(repo.to_string());
    }
    Ok(analyzed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use forgebot_triage::cli::AgentCliClient;

    fn unreachable_triage() -> TriageBackend {
        TriageBackend::Cli(AgentCliClient::with_program("/nonexistent/agent"))
    }

    #[tokio::test]
    async fn empty_repos_yield_no_open_issues_message() {
        let mut server = mockito::Server::new_async().await;
        let _issues = server
            .mock("GET", "/repos/owner/repo/issues")
            .match_query(mockito::Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;
        let _prs = server
            .mock("GET", "/repos/owner/repo/pulls")
            .match_query(mockito::Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let github = GithubClient::with_base_url("t", server.url());
        let (tx, mut rx) = mpsc::channel(8);

        run_suggest_cycle(
            &github,
            &unreachable_triage(),
            &["owner/repo".to_string()],
            &tx,
        )
        .await
        .unwrap();

        let message = rx.try_recv().unwrap();
        assert_eq!(message, "No open issues to suggest.");
    }

    #[tokio::test]
    async fn failing_repo_is_reported_and_skipped() {
        let mut server = mockito::Server::new_async().await;
        // owner/bad returns a 500; owner/good has no issues.
        let _bad = server
            .mock("GET", "/repos/owner/bad/issues")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .create_async()
            .await;
        let _good_issues = server
            .mock("GET", "/repos/owner/good/issues")
            .match_query(mockito::Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;
        let _good_prs = server
            .mock("GET", "/repos/owner/good/pulls")
            .match_query(mockito::Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let github = GithubClient::with_base_url("t", server.url());
        let (tx, mut rx) = mpsc::channel(8);

        run_suggest_cycle(
            &github,
            &unreachable_triage(),
            &["owner/bad".to_string(), "owner/good".to_string()],
            &tx,
        )
        .await
        .unwrap();

        let first = rx.try_recv().unwrap();
        assert!(first.contains("owner/bad"));

        // The good repo still completed, producing the empty-set message.
        let second = rx.try_recv().unwrap();
        assert_eq!(second, "No open issues to suggest.");
    }
}
