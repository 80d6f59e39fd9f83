//! Models for the GitHub REST v3 payloads forgebot consumes.
//!
//! Only the fields the bot actually uses are mapped; everything else in the
//! API responses is ignored.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// An issue label. The API sends full label objects; only the name matters.
#[derive(Debug, Clone, Deserialize)]
pub struct Label {
    pub name: String,
}

/// A user reference on issues and comments.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub login: String,
}

/// An open issue (or pull request — the issues endpoint returns both).
#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub labels: Vec<Label>,
    pub created_at: DateTime<Utc>,
    /// Present iff this "issue" is actually a pull request.
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

impl Issue {
    /// Whether this entry is a pull request rather than a plain issue.
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }

    /// Body text, empty if the API sent null.
    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or("")
    }

    /// JSON shape handed to the LLM for triage.
    pub fn to_prompt_json(&self) -> serde_json::Value {
        serde_json::json!({
            "number": self.number,
            "title": self.title,
            "body": self.body_text(),
            "labels": self.labels.iter().map(|l| l.name.clone()).collect::<Vec<_>>(),
            "createdAt": self.created_at.to_rfc3339(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Branch {
    #[serde(rename = "ref")]
    pub name: String,
}

/// An open pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub head: Branch,
    pub html_url: String,
}

impl PullRequest {
    /// The head branch name.
    pub fn branch(&self) -> &str {
        &self.head.name
    }

    /// Body text, empty if the API sent null.
    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or("")
    }

    /// JSON shape handed to the LLM when a PR list accompanies triage.
    pub fn to_prompt_json(&self) -> serde_json::Value {
        serde_json::json!({
            "number": self.number,
            "title": self.title,
            "body": self.body_text(),
            "branch": self.branch(),
        })
    }
}

/// A comment on a pull request — either a review comment anchored to a file
/// location or a plain issue comment.
#[derive(Debug, Clone, Deserialize)]
pub struct PrComment {
    pub user: User,
    #[serde(default)]
    pub body: Option<String>,
    /// File path; set only for review comments.
    #[serde(default)]
    pub path: Option<String>,
    /// Line number; review comments may omit it for outdated diffs.
    #[serde(default)]
    pub line: Option<u64>,
}

impl PrComment {
    /// Render the comment the way the coding-agent payload expects:
    /// `[path:line] @user: text` for review comments, `@user: text` for
    /// plain comments.
    pub fn render(&self) -> String {
        let body = self.body.as_deref().unwrap_or("");
        match &self.path {
            Some(path) => {
                let line = self
                    .line
                    .map(|l| l.to_string())
                    .unwrap_or_else(|| "?".to_string());
                format!("[{path}:{line}] @{}: {body}", self.user.login)
            }
            None => format!("@{}: {body}", self.user.login),
        }
    }
}
