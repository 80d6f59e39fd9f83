//! The analysis contract: output models, fence normalization, and strict
//! decoding.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TriageError};

/// Estimated difficulty of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Estimated urgency of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        f.write_str(s)
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
        };
        f.write_str(s)
    }
}

/// One triaged issue, as returned by [`analyze`](crate::TriageBackend::analyze).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzedIssue {
    pub number: u64,
    pub title: String,
    pub difficulty: Difficulty,
    pub urgency: Urgency,
    /// One-line summary of what needs to be done.
    pub summary: String,
    /// Whether an open pull request already appears to address this issue.
    pub has_pr: bool,
    /// Source repo, attached by callers that aggregate across repos.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
}

/// A suggested issue from a codebase review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueSuggestion {
    pub title: String,
    pub body: String,
}

/// Strip a markdown code fence wrapping, if present.
///
/// Contract: when the trimmed input starts with a ``` fence line (with or
/// without a language tag), that first line and a trailing ``` line are
/// removed; the content between them is returned untouched. Input without
/// a leading fence is returned unchanged (modulo outer whitespace trim).
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the rest of the fence line (e.g. a "json" tag).
    let body = match rest.split_once('\n') {
        Some((_tag, body)) => body,
        None => return trimmed,
    };
    body.trim_end()
        .strip_suffix("```")
        .map(str::trim)
        .unwrap_or_else(|| body.trim())
}

/// Decode an analysis response and enforce the number round-trip.
///
/// The response must be a JSON array with exactly one record per input
/// issue number — no additions, omissions, or duplicates — and every
/// record must carry all required keys. Violations are errors, not
/// something to silently repair.
pub fn decode_analysis(input_numbers: &[u64], response: &str) -> Result<Vec<AnalyzedIssue>> {
    let json = strip_code_fences(response);
    let analyzed: Vec<AnalyzedIssue> = serde_json::from_str(json)
        .map_err(|e| TriageError::Contract(format!("response is not a valid analysis array: {e}")))?;

    let expected: BTreeSet<u64> = input_numbers.iter().copied().collect();
    let mut seen = BTreeSet::new();
    for issue in &analyzed {
        if !expected.contains(&issue.number) {
            return Err(TriageError::Contract(format!(
                "unexpected issue number {} in response",
                issue.number
            )));
        }
        if !seen.insert(issue.number) {
            return Err(TriageError::Contract(format!(
                "duplicate issue number {} in response",
                issue.number
            )));
        }
    }
    if seen.len() != expected.len() {
        let missing: Vec<u64> = expected.difference(&seen).copied().collect();
        return Err(TriageError::Contract(format!(
            "response omitted issue numbers {missing:?}"
        )));
    }

    Ok(analyzed)
}

/// Decode a codebase-review response. Unlike analysis, an unparseable or
/// empty response yields an empty list rather than an error.
pub fn decode_suggestions(response: &str) -> Vec<IssueSuggestion> {
    let json = strip_code_fences(response);
    serde_json::from_str(json).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANALYSIS: &str = r#"[
        {"number": 1, "title": "Bug", "difficulty": "easy", "urgency": "high",
         "summary": "Fix the bug", "has_pr": false},
        {"number": 2, "title": "Feature", "difficulty": "hard", "urgency": "low",
         "summary": "Add feature", "has_pr": true}
    ]"#;

    #[test]
    fn strip_fences_plain_passthrough() {
        assert_eq!(strip_code_fences("  [1, 2]  "), "[1, 2]");
    }

    #[test]
    fn strip_fences_removes_json_fence() {
        let fenced = "```json\n[1, 2]\n```";
        assert_eq!(strip_code_fences(fenced), "[1, 2]");
    }

    #[test]
    fn strip_fences_removes_bare_fence() {
        let fenced = "```\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(fenced), "{\"a\": 1}");
    }

    #[test]
    fn fenced_and_unfenced_decode_identically() {
        let fenced = format!("```json\n{ANALYSIS}\n```");
        let a = decode_analysis(&[1, 2], ANALYSIS).unwrap();
        let b = decode_analysis(&[1, 2], &fenced).unwrap();
        assert_eq!(a.len(), b.len());
        assert_eq!(a[0].number, b[0].number);
        assert_eq!(a[1].summary, b[1].summary);
    }

    #[test]
    fn decode_preserves_fields() {
        let analyzed = decode_analysis(&[1, 2], ANALYSIS).unwrap();
        assert_eq!(analyzed[0].difficulty, Difficulty::Easy);
        assert_eq!(analyzed[0].urgency, Urgency::High);
        assert!(!analyzed[0].has_pr);
        assert!(analyzed[1].has_pr);
    }

    #[test]
    fn decode_rejects_missing_number() {
        let err = decode_analysis(&[1, 2, 3], ANALYSIS).unwrap_err();
        assert!(matches!(err, TriageError::Contract(_)));
        assert!(err.to_string().contains("[3]"));
    }

    #[test]
    fn decode_rejects_extra_number() {
        let err = decode_analysis(&[1], ANALYSIS).unwrap_err();
        assert!(matches!(err, TriageError::Contract(_)));
    }

    #[test]
    fn decode_rejects_duplicates() {
        let dup = r#"[
            {"number": 1, "title": "A", "difficulty": "easy", "urgency": "low",
             "summary": "s", "has_pr": false},
            {"number": 1, "title": "A again", "difficulty": "easy", "urgency": "low",
             "summary": "s", "has_pr": false}
        ]"#;
        let err = decode_analysis(&[1], dup).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn decode_rejects_missing_keys() {
        let incomplete = r#"[{"number": 1, "title": "A"}]"#;
        assert!(matches!(
            decode_analysis(&[1], incomplete),
            Err(TriageError::Contract(_))
        ));
    }

    #[test]
    fn decode_rejects_prose() {
        assert!(decode_analysis(&[1], "I think issue 1 is easy.").is_err());
    }

    #[test]
    fn suggestions_tolerate_garbage() {
        assert!(decode_suggestions("not json at all").is_empty());
        assert!(decode_suggestions("").is_empty());

        let parsed = decode_suggestions(r#"[{"title": "Add CI", "body": "No CI configured."}]"#);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].title, "Add CI");
    }
}
