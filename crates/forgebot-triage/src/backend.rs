//! Backend selection and the four triage operations.

use std::path::Path;

use forgebot_github::{Issue, PrComment, PullRequest};
use tracing::info;

use crate::anthropic::AnthropicClient;
use crate::cli::AgentCliClient;
use crate::contract::{self, AnalyzedIssue, IssueSuggestion};
use crate::error::Result;
use crate::prompts;

/// Fixed reply when there is nothing to suggest.
pub const NO_OPEN_ISSUES: &str = "No open issues found.";

const ANALYZE_MAX_TOKENS: u32 = 2048;
const SUGGEST_MAX_TOKENS: u32 = 512;
const REVIEW_MAX_TOKENS: u32 = 2048;

/// LLM backend, chosen once at startup.
///
/// `Api` talks to the hosted Anthropic API; `Cli` shells out to the local
/// agent CLI. The split exists so a missing API key degrades to the CLI
/// rather than disabling triage.
#[derive(Clone)]
pub enum TriageBackend {
    Api(AnthropicClient),
    Cli(AgentCliClient),
}

impl TriageBackend {
    /// Select a backend from the optional API key.
    pub fn from_config(anthropic_api_key: Option<&str>) -> Result<Self> {
        match anthropic_api_key {
            Some(key) if !key.is_empty() => {
                info!("Triage backend: Anthropic API");
                Ok(TriageBackend::Api(AnthropicClient::new(key)))
            }
            _ => {
                let cli = AgentCliClient::from_path()?;
                info!("Triage backend: local agent CLI");
                Ok(TriageBackend::Cli(cli))
            }
        }
    }

    async fn complete(
        &self,
        system: Option<&str>,
        prompt: &str,
        max_tokens: u32,
        cwd: Option<&Path>,
    ) -> Result<String> {
        match self {
            TriageBackend::Api(client) => client.complete(system, prompt, max_tokens).await,
            TriageBackend::Cli(client) => client.complete(system, prompt, cwd).await,
        }
    }

    /// Estimate difficulty, urgency, and PR coverage for each issue.
    ///
    /// Returns exactly one record per input issue, keyed by the same
    /// numbers; anything else from the LLM is a contract violation. Empty
    /// input returns empty output without calling the LLM.
    pub async fn analyze(
        &self,
        issues: &[Issue],
        prs: Option<&[PullRequest]>,
    ) -> Result<Vec<AnalyzedIssue>> {
        if issues.is_empty() {
            return Ok(Vec::new());
        }

        let prompt = prompts::analyze(issues, prs);
        let response = self
            .complete(Some(prompts::TRIAGE_SYSTEM), &prompt, ANALYZE_MAX_TOKENS, None)
            .await?;

        let numbers: Vec<u64> = issues.iter().map(|i| i.number).collect();
        contract::decode_analysis(&numbers, &response)
    }

    /// Suggest which issue to tackle next, as 2-3 sentences of free text.
    ///
    /// Empty input returns the fixed no-open-issues text without calling
    /// the LLM.
    pub async fn suggest_next(&self, analyzed: &[AnalyzedIssue]) -> Result<String> {
        if analyzed.is_empty() {
            return Ok(NO_OPEN_ISSUES.to_string());
        }

        let prompt = prompts::suggest_next(analyzed);
        self.complete(None, &prompt, SUGGEST_MAX_TOKENS, None).await
    }

    /// Review a checked-out repository and propose new issues, avoiding
    /// duplicates of `existing_titles`. Unparseable output yields an empty
    /// list, not an error.
    pub async fn review_codebase(
        &self,
        path: &Path,
        existing_titles: &[String],
    ) -> Result<Vec<IssueSuggestion>> {
        let prompt = prompts::review_codebase(existing_titles);
        let response = self
            .complete(None, &prompt, REVIEW_MAX_TOKENS, Some(path))
            .await?;
        Ok(contract::decode_suggestions(&response))
    }

    /// Free-text review of a pull request: overall assessment, top
    /// concerns, outstanding comment items.
    pub async fn review_pr(
        &self,
        pr: &PullRequest,
        comments: &[PrComment],
        path: &Path,
    ) -> Result<String> {
        let prompt = prompts::review_pr(pr, comments);
        self.complete(None, &prompt, REVIEW_MAX_TOKENS, Some(path)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::AgentCliClient;

    /// Backend whose CLI binary does not exist — any actual invocation
    /// would error, so `Ok` results prove the LLM was never called.
    fn unreachable_backend() -> TriageBackend {
        TriageBackend::Cli(AgentCliClient::with_program("/nonexistent/agent"))
    }

    #[tokio::test]
    async fn analyze_empty_skips_llm() {
        let backend = unreachable_backend();
        let result = backend.analyze(&[], None).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn suggest_next_empty_skips_llm() {
        let backend = unreachable_backend();
        let result = backend.suggest_next(&[]).await.unwrap();
        assert_eq!(result, NO_OPEN_ISSUES);
    }

    #[tokio::test]
    async fn analyze_roundtrips_numbers_through_api() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "content": [{"type": "text", "text": "```json\n[\
                        {\"number\": 7, \"title\": \"Bug\", \"difficulty\": \"easy\",\
                         \"urgency\": \"high\", \"summary\": \"Fix it\", \"has_pr\": false}\
                    ]\n```"}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let backend = TriageBackend::Api(AnthropicClient::with_base_url("k", server.url()));
        let issue: Issue = serde_json::from_value(serde_json::json!({
            "number": 7,
            "title": "Bug",
            "created_at": "2024-01-01T00:00:00Z",
        }))
        .unwrap();

        let analyzed = backend.analyze(&[issue], None).await.unwrap();
        assert_eq!(analyzed.len(), 1);
        assert_eq!(analyzed[0].number, 7);
    }

    #[tokio::test]
    async fn analyze_rejects_mismatched_numbers_from_api() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "content": [{"type": "text", "text": "[\
                        {\"number\": 99, \"title\": \"Wrong\", \"difficulty\": \"easy\",\
                         \"urgency\": \"low\", \"summary\": \"s\", \"has_pr\": false}\
                    ]"}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let backend = TriageBackend::Api(AnthropicClient::with_base_url("k", server.url()));
        let issue: Issue = serde_json::from_value(serde_json::json!({
            "number": 7,
            "title": "Bug",
            "created_at": "2024-01-01T00:00:00Z",
        }))
        .unwrap();

        assert!(backend.analyze(&[issue], None).await.is_err());
    }
}
