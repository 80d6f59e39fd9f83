//! The issue-check cycle.
//!
//! Each cycle fetches the live open-issue set per repo, diffs it against
//! the ledger, triages only the newly observed issues, and notifies once
//! per repo with news. The ledger is updated for every repo and persisted
//! once, after all repos have been processed. A repo's first observation
//! seeds its ledger entry without notifying.

use std::collections::BTreeSet;
use std::path::Path;

use forgebot_core::{Ledger, LedgerEntry};
use forgebot_github::{GithubClient, Issue};
use forgebot_triage::{AnalyzedIssue, TriageBackend};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::{Result, SchedulerError};

/// Outcome of diffing one repo's live issues against its ledger entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerDiff {
    /// Repo never observed before; seed silently.
    FirstObservation,
    /// Issue numbers present live but not in the ledger (may be empty).
    New(BTreeSet<u64>),
}

/// Diff a repo's live issue numbers against its ledger entry.
pub fn diff_known(entry: &LedgerEntry, live: &BTreeSet<u64>) -> LedgerDiff {
    match entry {
        LedgerEntry::Unknown => LedgerDiff::FirstObservation,
        LedgerEntry::Known(known) => LedgerDiff::New(live.difference(known).copied().collect()),
    }
}

/// One notification block per repo with new issues.
pub fn format_new_issues(repo: &str, analyzed: &[AnalyzedIssue]) -> String {
    let mut text = format!("New issues in {repo}:\n\n");
    for issue in analyzed {
        text.push_str(&format!(
            "#{} {}\n  Difficulty: {} | Urgency: {}\n  {}\n\n",
            issue.number, issue.title, issue.difficulty, issue.urgency, issue.summary
        ));
    }
    text
}

/// Run one full check cycle over all configured repos.
///
/// Any failure aborts the cycle and is reported by the caller as a single
/// failure notification; the ledger is only persisted after a fully
/// successful pass, so a failed cycle re-examines the same baseline next
/// time.
pub async fn run_check_cycle(
    github: &GithubClient,
    triage: &TriageBackend,
    repos: &[String],
    ledger_path: &Path,
    notify: &mpsc::Sender<String>,
) -> Result<()> {
    let mut ledger = Ledger::load(ledger_path)?;
    let mut notified_any = false;

    for repo in repos {
        let issues = github.list_issues(repo, false).await?;
        let live: BTreeSet<u64> = issues.iter().map(|i| i.number).collect();

        match diff_known(&ledger.entry(repo), &live) {
            LedgerDiff::FirstObservation => {
                info!(repo, count = live.len(), "First observation, seeding ledger");
            }
            LedgerDiff::New(new_numbers) if !new_numbers.is_empty() => {
                let new_issues: Vec<Issue> = issues
                    .iter()
                    .filter(|i| new_numbers.contains(&i.number))
                    .cloned()
                    .collect();
                info!(repo, count = new_issues.len(), "New issues detected");

                let analyzed = triage.analyze(&new_issues, None).await?;
                notify
                    .send(format_new_issues(repo, &analyzed))
                    .await
                    .map_err(|_| SchedulerError::ChannelClosed)?;
                notified_any = true;
            }
            LedgerDiff::New(_) => {
                debug!(repo, "No new issues");
            }
        }

        ledger.record(repo, live);
    }

    ledger.save()?;

    if !notified_any {
        notify
            .send("No new issues in any watched repo.".to_string())
            .await
            .map_err(|_| SchedulerError::ChannelClosed)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use forgebot_triage::anthropic::AnthropicClient;
    use forgebot_triage::cli::AgentCliClient;
    use tempfile::tempdir;

    fn issues_body(numbers: &[u64]) -> String {
        let issues: Vec<serde_json::Value> = numbers
            .iter()
            .map(|n| {
                serde_json::json!({
                    "number": n,
                    "title": format!("Issue {n}"),
                    "body": "details",
                    "created_at": "2024-01-01T00:00:00Z",
                })
            })
            .collect();
        serde_json::Value::Array(issues).to_string()
    }

    /// Triage backend that fails on any actual call.
    fn unreachable_triage() -> TriageBackend {
        TriageBackend::Cli(AgentCliClient::with_program("/nonexistent/agent"))
    }

    #[test]
    fn diff_unknown_is_first_observation() {
        let live = BTreeSet::from([1, 2]);
        assert_eq!(
            diff_known(&LedgerEntry::Unknown, &live),
            LedgerDiff::FirstObservation
        );
    }

    #[test]
    fn diff_known_returns_set_difference() {
        let entry = LedgerEntry::Known(BTreeSet::from([1, 2]));
        let live = BTreeSet::from([1, 2, 3]);
        assert_eq!(diff_known(&entry, &live), LedgerDiff::New(BTreeSet::from([3])));
    }

    #[test]
    fn diff_known_empty_when_nothing_new() {
        let entry = LedgerEntry::Known(BTreeSet::from([1, 2]));
        let live = BTreeSet::from([1, 2]);
        assert_eq!(diff_known(&entry, &live), LedgerDiff::New(BTreeSet::new()));
    }

    #[tokio::test]
    async fn first_cycle_seeds_without_notifying() {
        let mut server = mockito::Server::new_async().await;
        let _issues = server
            .mock("GET", "/repos/owner/repo/issues")
            .match_query(mockito::Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body(issues_body(&[1, 2]))
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let ledger_path = dir.path().join("ledger.json");
        let github = GithubClient::with_base_url("t", server.url());
        let (tx, mut rx) = mpsc::channel(8);

        // The unreachable triage backend doubles as proof that first
        // observation never triages.
        run_check_cycle(
            &github,
            &unreachable_triage(),
            &["owner/repo".to_string()],
            &ledger_path,
            &tx,
        )
        .await
        .unwrap();

        let message = rx.try_recv().unwrap();
        assert!(message.contains("No new issues"));
        assert!(rx.try_recv().is_err());

        let ledger = Ledger::load(&ledger_path).unwrap();
        assert_eq!(
            ledger.entry("owner/repo"),
            LedgerEntry::Known(BTreeSet::from([1, 2]))
        );
    }

    #[tokio::test]
    async fn second_cycle_notifies_only_new_issues() {
        let mut server = mockito::Server::new_async().await;
        let _issues = server
            .mock("GET", "/repos/owner/repo/issues")
            .match_query(mockito::Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body(issues_body(&[1, 2, 3]))
            .create_async()
            .await;

        let mut llm = mockito::Server::new_async().await;
        let _analysis = llm
            .mock("POST", "/v1/messages")
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "content": [{"type": "text", "text": "[\
                        {\"number\": 3, \"title\": \"Issue 3\", \"difficulty\": \"easy\",\
                         \"urgency\": \"high\", \"summary\": \"Fix it\", \"has_pr\": false}\
                    ]"}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let ledger_path = dir.path().join("ledger.json");

        // Seed the ledger: issues 1 and 2 already known.
        let mut ledger = Ledger::load(&ledger_path).unwrap();
        ledger.record("owner/repo", BTreeSet::from([1, 2]));
        ledger.save().unwrap();

        let github = GithubClient::with_base_url("t", server.url());
        let triage = TriageBackend::Api(AnthropicClient::with_base_url("k", llm.url()));
        let (tx, mut rx) = mpsc::channel(8);

        run_check_cycle(&github, &triage, &["owner/repo".to_string()], &ledger_path, &tx)
            .await
            .unwrap();

        let message = rx.try_recv().unwrap();
        assert!(message.contains("New issues in owner/repo"));
        assert!(message.contains("#3"));
        assert!(!message.contains("#1 "));
        // Exactly one notification, no heartbeat.
        assert!(rx.try_recv().is_err());

        let ledger = Ledger::load(&ledger_path).unwrap();
        assert_eq!(
            ledger.entry("owner/repo"),
            LedgerEntry::Known(BTreeSet::from([1, 2, 3]))
        );
    }

    #[tokio::test]
    async fn quiet_cycle_emits_single_heartbeat() {
        let mut server = mockito::Server::new_async().await;
        let _a = server
            .mock("GET", "/repos/owner/alpha/issues")
            .match_query(mockito::Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;
        let _b = server
            .mock("GET", "/repos/owner/beta/issues")
            .match_query(mockito::Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let ledger_path = dir.path().join("ledger.json");
        let github = GithubClient::with_base_url("t", server.url());
        let (tx, mut rx) = mpsc::channel(8);

        run_check_cycle(
            &github,
            &unreachable_triage(),
            &["owner/alpha".to_string(), "owner/beta".to_string()],
            &ledger_path,
            &tx,
        )
        .await
        .unwrap();

        let message = rx.try_recv().unwrap();
        assert!(message.contains("No new issues"));
        assert!(rx.try_recv().is_err());

        // Both repos became known, with empty sets.
        let ledger = Ledger::load(&ledger_path).unwrap();
        assert!(ledger.entry("owner/alpha").is_known());
        assert!(ledger.entry("owner/beta").is_known());
    }
}
