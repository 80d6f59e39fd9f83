//! LLM triage for forgebot.
//!
//! Exposes four operations over a [`TriageBackend`]: batch issue analysis,
//! next-work suggestion, codebase review, and PR review. The backend is
//! selected once at startup — the hosted Anthropic API when a key is
//! configured, the local agent CLI otherwise.
//!
//! Analysis responses are held to a strict contract: the output must be a
//! JSON array carrying exactly the input issue numbers. Markdown code
//! fences around the JSON are tolerated (and stripped); anything else that
//! fails to parse is surfaced as a contract violation, never coerced.

pub mod anthropic;
pub mod backend;
pub mod cli;
pub mod contract;
pub mod error;
pub mod prompts;

pub use backend::TriageBackend;
pub use contract::{AnalyzedIssue, Difficulty, IssueSuggestion, Urgency};
pub use error::{Result, TriageError};
