//! GitHub collaborator for forgebot.
//!
//! Two halves: a thin REST v3 client ([`GithubClient`]) for issues, pull
//! requests, and comments, and git subprocess operations ([`git`]) for
//! clone/branch/push against a local workspace.

pub mod client;
pub mod error;
pub mod git;
pub mod models;

pub use client::GithubClient;
pub use error::{GithubError, Result};
pub use models::{Issue, PrComment, PullRequest};
