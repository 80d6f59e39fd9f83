//! GitHub REST v3 client.

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{GithubError, Result};
use crate::models::{Issue, PrComment, PullRequest};

/// GitHub API base URL.
const GITHUB_API_BASE: &str = "https://api.github.com";

/// User-Agent header required by the GitHub API.
const USER_AGENT: &str = "forgebot";

/// API version header value.
const API_VERSION: &str = "2022-11-28";

/// Issue listings are capped at the newest entries; a triage batch never
/// needs more.
const LIST_LIMIT: usize = 30;

/// Async GitHub REST client.
#[derive(Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    token: String,
    base_url: String,
}

#[derive(Serialize)]
struct CreatePrRequest<'a> {
    title: &'a str,
    body: &'a str,
    head: &'a str,
    base: &'a str,
}

#[derive(Serialize)]
struct CreateIssueRequest<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(serde::Deserialize)]
struct RepoInfo {
    default_branch: String,
}

#[derive(serde::Deserialize)]
struct CreatedUrl {
    html_url: String,
}

impl GithubClient {
    /// Create a client with the given personal access token.
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, GITHUB_API_BASE)
    }

    /// Create a client against a custom API base URL (used in tests).
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token: token.into(),
            base_url: base_url.into(),
        }
    }

    /// The token, for embedding in clone URLs.
    pub fn token(&self) -> &str {
        &self.token
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "GitHub GET");
        let response = self
            .http
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
            .header("X-GitHub-Api-Version", API_VERSION)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GithubError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| GithubError::Parse(e.to_string()))
    }

    async fn post_json<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "GitHub POST");
        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
            .header("X-GitHub-Api-Version", API_VERSION)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GithubError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| GithubError::Parse(e.to_string()))
    }

    /// List open issues for a repo, newest first, capped at 30.
    ///
    /// The issues endpoint also returns pull requests; they are filtered
    /// out unless `include_prs` is set.
    pub async fn list_issues(&self, repo: &str, include_prs: bool) -> Result<Vec<Issue>> {
        let issues: Vec<Issue> = self
            .get_json(&format!(
                "/repos/{repo}/issues?state=open&per_page={LIST_LIMIT}"
            ))
            .await?;

        Ok(issues
            .into_iter()
            .filter(|i| include_prs || !i.is_pull_request())
            .take(LIST_LIMIT)
            .collect())
    }

    /// Get a single issue with full details.
    pub async fn get_issue(&self, repo: &str, number: u64) -> Result<Issue> {
        self.get_json(&format!("/repos/{repo}/issues/{number}")).await
    }

    /// List open pull requests for a repo.
    pub async fn list_prs(&self, repo: &str) -> Result<Vec<PullRequest>> {
        self.get_json(&format!("/repos/{repo}/pulls?state=open&per_page={LIST_LIMIT}"))
            .await
    }

    /// Get a single pull request.
    pub async fn get_pr(&self, repo: &str, number: u64) -> Result<PullRequest> {
        self.get_json(&format!("/repos/{repo}/pulls/{number}")).await
    }

    /// Get all comments on a pull request: review comments (file-anchored)
    /// followed by plain issue comments.
    pub async fn get_pr_comments(&self, repo: &str, number: u64) -> Result<Vec<PrComment>> {
        let mut comments: Vec<PrComment> = self
            .get_json(&format!("/repos/{repo}/pulls/{number}/comments"))
            .await?;
        let issue_comments: Vec<PrComment> = self
            .get_json(&format!("/repos/{repo}/issues/{number}/comments"))
            .await?;
        comments.extend(issue_comments);
        Ok(comments)
    }

    /// The repo's default branch.
    pub async fn default_branch(&self, repo: &str) -> Result<String> {
        let info: RepoInfo = self.get_json(&format!("/repos/{repo}")).await?;
        Ok(info.default_branch)
    }

    /// Open pull request whose head is `branch`, if one exists.
    pub async fn find_pr_for_branch(
        &self,
        repo: &str,
        branch: &str,
    ) -> Result<Option<PullRequest>> {
        let owner = repo.split('/').next().unwrap_or(repo);
        let prs: Vec<PullRequest> = self
            .get_json(&format!(
                "/repos/{repo}/pulls?state=open&head={owner}:{branch}"
            ))
            .await?;
        Ok(prs.into_iter().next())
    }

    /// Create a pull request from `branch` into the default branch and
    /// return its URL.
    ///
    /// Idempotent: if an open PR already exists for the branch, its URL is
    /// returned and no new PR is created.
    pub async fn create_pr(
        &self,
        repo: &str,
        title: &str,
        body: &str,
        branch: &str,
    ) -> Result<String> {
        if let Some(existing) = self.find_pr_for_branch(repo, branch).await? {
            info!(repo, branch, url = %existing.html_url, "Reusing existing PR");
            return Ok(existing.html_url);
        }

        let base = self.default_branch(repo).await?;
        let created: CreatedUrl = self
            .post_json(
                &format!("/repos/{repo}/pulls"),
                &CreatePrRequest {
                    title,
                    body,
                    head: branch,
                    base: &base,
                },
            )
            .await?;
        info!(repo, branch, url = %created.html_url, "Created PR");
        Ok(created.html_url)
    }

    /// File a new issue and return its URL.
    pub async fn create_issue(&self, repo: &str, title: &str, body: &str) -> Result<String> {
        let created: CreatedUrl = self
            .post_json(
                &format!("/repos/{repo}/issues"),
                &CreateIssueRequest { title, body },
            )
            .await?;
        info!(repo, url = %created.html_url, "Created issue");
        Ok(created.html_url)
    }
}
