//! Prompt construction for the triage operations.

use forgebot_github::{Issue, PrComment, PullRequest};

use crate::contract::AnalyzedIssue;

/// System prompt for analysis calls.
pub const TRIAGE_SYSTEM: &str = "You are a software development triage assistant. \
You analyze GitHub issues and estimate their difficulty and urgency.\n\n\
Respond in JSON only. No markdown fences.";

/// Prompt for batch issue analysis.
pub fn analyze(issues: &[Issue], prs: Option<&[PullRequest]>) -> String {
    let issues_json = serde_json::Value::Array(
        issues.iter().map(Issue::to_prompt_json).collect(),
    );

    let mut prompt = format!(
        "Analyze these GitHub issues. For each, estimate:\n\
         - difficulty: easy / medium / hard\n\
         - urgency: low / medium / high\n\
         - summary: one-line summary of what needs to be done\n\
         - has_pr: true if one of the open pull requests below already appears to address it, else false\n\n\
         Issues:\n{}\n",
        serde_json::to_string_pretty(&issues_json).unwrap_or_default()
    );

    match prs {
        Some(prs) if !prs.is_empty() => {
            let prs_json = serde_json::Value::Array(
                prs.iter().map(PullRequest::to_prompt_json).collect(),
            );
            prompt.push_str(&format!(
                "\nOpen pull requests:\n{}\n",
                serde_json::to_string_pretty(&prs_json).unwrap_or_default()
            ));
        }
        _ => {
            prompt.push_str("\nThere are no open pull requests; has_pr is false for every issue.\n");
        }
    }

    prompt.push_str(
        "\nReturn a JSON array of objects with keys: number, title, difficulty, urgency, summary, has_pr.",
    );
    prompt
}

/// Prompt for the "what to work on next" suggestion.
pub fn suggest_next(analyzed: &[AnalyzedIssue]) -> String {
    format!(
        "Given these GitHub issues with analysis, suggest which one to work on next and why. \
         Be concise (2-3 sentences). Skip issues where has_pr is true — those are already being \
         addressed by an open pull request.\n\n\
         Issues:\n{}",
        serde_json::to_string_pretty(analyzed).unwrap_or_default()
    )
}

/// Prompt for reviewing a checked-out codebase and proposing new issues.
pub fn review_codebase(existing_titles: &[String]) -> String {
    let existing = if existing_titles.is_empty() {
        "(none)".to_string()
    } else {
        existing_titles
            .iter()
            .map(|t| format!("- {t}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "Review the codebase in the current directory. Identify concrete, actionable \
         improvements: bugs, missing tests, documentation gaps, CI weaknesses. \
         Do not duplicate any of these existing open issues:\n{existing}\n\n\
         Return a JSON array of objects with keys: title, body. Each body should explain \
         the problem and a suggested approach. Return at most 5 suggestions. \
         JSON only, no markdown fences."
    )
}

/// Prompt for a free-text PR review.
pub fn review_pr(pr: &PullRequest, comments: &[PrComment]) -> String {
    let rendered_comments = if comments.is_empty() {
        "(none)".to_string()
    } else {
        comments
            .iter()
            .map(|c| format!("- {}", c.render()))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "Review pull request #{} in the repository checked out in the current directory.\n\n\
         Title: {}\n\n{}\n\nExisting review comments:\n{}\n\n\
         Give an overall assessment, your top concerns, and which of the existing comments \
         remain unaddressed. Plain text, a few short paragraphs.",
        pr.number,
        pr.title,
        pr.body_text(),
        rendered_comments
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{Difficulty, Urgency};

    fn issue(number: u64, title: &str) -> Issue {
        serde_json::from_value(serde_json::json!({
            "number": number,
            "title": title,
            "body": "details",
            "created_at": "2024-01-01T00:00:00Z",
        }))
        .unwrap()
    }

    #[test]
    fn analyze_prompt_embeds_issues_and_keys() {
        let prompt = analyze(&[issue(1, "Crash on start")], None);
        assert!(prompt.contains("Crash on start"));
        assert!(prompt.contains("has_pr"));
        assert!(prompt.contains("no open pull requests"));
    }

    #[test]
    fn suggest_prompt_mentions_pr_skip_rule() {
        let analyzed = vec![AnalyzedIssue {
            number: 1,
            title: "Bug".to_string(),
            difficulty: Difficulty::Easy,
            urgency: Urgency::High,
            summary: "Fix it".to_string(),
            has_pr: false,
            repo: Some("owner/repo".to_string()),
        }];
        let prompt = suggest_next(&analyzed);
        assert!(prompt.contains("Skip issues where has_pr is true"));
        assert!(prompt.contains("owner/repo"));
    }

    #[test]
    fn review_prompt_lists_existing_issues() {
        let prompt = review_codebase(&["Flaky test in CI".to_string()]);
        assert!(prompt.contains("- Flaky test in CI"));
    }
}
