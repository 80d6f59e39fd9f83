//! Command handlers.
//!
//! Every handler replies on the same chat the command arrived on. Errors
//! from collaborators become plain-text replies; nothing here propagates a
//! failure past the handler boundary.

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{info, warn};

use forgebot_triage::AnalyzedIssue;
use forgebot_worker::TaskStatus;

use crate::bot::send_chunked;
use crate::commands::Command;
use crate::state::BotState;

/// Dispatch a parsed command.
///
/// Authorization gate: `/start` is handled even before a claim (it is the
/// claim); every other command requires the bound chat. Commands from any
/// other chat are dropped without a reply.
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<BotState>,
) -> ResponseResult<()> {
    let chat_id = msg.chat.id.0;

    if let Command::Start = cmd {
        return handle_start(bot, msg, state).await;
    }

    if !state.is_bound(chat_id) {
        info!(chat_id, ?cmd, "Ignoring command from unbound chat");
        return Ok(());
    }

    match cmd {
        Command::Start => unreachable!("handled above"),
        Command::Help => handle_help(bot, msg).await,
        Command::Issues(arg) => handle_issues(bot, msg, state, arg).await,
        Command::Prs(arg) => handle_prs(bot, msg, state, arg).await,
        Command::Suggest(arg) => handle_suggest(bot, msg, state, arg).await,
        Command::Work(arg) => handle_work(bot, msg, state, arg).await,
        Command::Pr(arg) => handle_pr(bot, msg, state, arg).await,
        Command::Review(arg) => handle_review(bot, msg, state, arg).await,
        Command::Status => handle_status(bot, msg, state).await,
        Command::Repos => handle_repos(bot, msg, state).await,
    }
}

const HELP_TEXT: &str = "forgebot is running. Commands:\n\
    /issues [repo] - list open issues with estimates\n\
    /prs [repo] - list open pull requests\n\
    /suggest [repo] - suggest what to work on next\n\
    /work <number> - fix an issue and open a PR\n\
    /pr <number> [instructions] - address PR review comments\n\
    /review [repo] - review a codebase and file issues\n\
    /status - check current work status\n\
    /repos - list watched repositories";

async fn handle_start(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let chat_id = msg.chat.id.0;

    if state.is_bound(chat_id) {
        bot.send_message(msg.chat.id, HELP_TEXT).await?;
        return Ok(());
    }

    if state.bound_chat().is_some() {
        // Claimed by someone else; this is the entire authorization model.
        info!(chat_id, "Ignoring /start from non-bound chat");
        return Ok(());
    }

    match state.claim_chat(chat_id) {
        Ok(_) => {
            info!(chat_id, "Bot claimed");
            bot.send_message(
                msg.chat.id,
                format!("This chat now controls forgebot.\n\n{HELP_TEXT}"),
            )
            .await?;
        }
        Err(e) => {
            warn!(chat_id, error = %e, "Failed to persist chat claim");
            bot.send_message(msg.chat.id, format!("Error claiming bot: {e}"))
                .await?;
        }
    }
    Ok(())
}

async fn handle_help(bot: Bot, msg: Message) -> ResponseResult<()> {
    bot.send_message(msg.chat.id, HELP_TEXT).await?;
    Ok(())
}

/// Render one analyzed issue the way list and notification output expects.
fn format_analyzed(issue: &AnalyzedIssue) -> String {
    let pr_note = if issue.has_pr { "  (open PR exists)\n" } else { "" };
    format!(
        "#{} {}\n  Difficulty: {} | Urgency: {}\n  {}\n{pr_note}\n",
        issue.number, issue.title, issue.difficulty, issue.urgency, issue.summary
    )
}

async fn handle_issues(
    bot: Bot,
    msg: Message,
    state: Arc<BotState>,
    arg: String,
) -> ResponseResult<()> {
    let repos = match state.target_repos(&arg) {
        Ok(repos) => repos,
        Err(reply) => {
            bot.send_message(msg.chat.id, reply).await?;
            return Ok(());
        }
    };

    bot.send_message(msg.chat.id, "Fetching issues...").await?;

    let multi = repos.len() > 1;
    let mut text = String::new();
    for repo in &repos {
        let section = match list_and_analyze(&state, repo).await {
            Ok(analyzed) if analyzed.is_empty() => format!("No open issues in {repo}.\n\n"),
            Ok(analyzed) => {
                let mut s = if multi { format!("{repo}:\n\n") } else { String::new() };
                for issue in &analyzed {
                    s.push_str(&format_analyzed(issue));
                }
                s
            }
            Err(e) => format!("Error fetching {repo}: {e}\n\n"),
        };
        text.push_str(&section);
    }

    send_chunked(&bot, msg.chat.id, text.trim_end()).await?;
    Ok(())
}

/// Fetch open issues and PRs for a repo and triage the issues.
async fn list_and_analyze(
    state: &BotState,
    repo: &str,
) -> Result<Vec<AnalyzedIssue>, String> {
    let issues = state
        .github
        .list_issues(repo, false)
        .await
        .map_err(|e| e.to_string())?;
    if issues.is_empty() {
        return Ok(Vec::new());
    }
    let prs = state.github.list_prs(repo).await.map_err(|e| e.to_string())?;
    state
        .triage
        .analyze(&issues, Some(&prs))
        .await
        .map_err(|e| e.to_string())
}

async fn handle_prs(
    bot: Bot,
    msg: Message,
    state: Arc<BotState>,
    arg: String,
) -> ResponseResult<()> {
    let repos = match state.target_repos(&arg) {
        Ok(repos) => repos,
        Err(reply) => {
            bot.send_message(msg.chat.id, reply).await?;
            return Ok(());
        }
    };

    let multi = repos.len() > 1;
    let mut text = String::new();
    for repo in &repos {
        match state.github.list_prs(repo).await {
            Ok(prs) if prs.is_empty() => {
                text.push_str(&format!("No open pull requests in {repo}.\n\n"));
            }
            Ok(prs) => {
                if multi {
                    text.push_str(&format!("{repo}:\n"));
                }
                for pr in &prs {
                    text.push_str(&format!(
                        "#{} {} ({})\n  {}\n",
                        pr.number,
                        pr.title,
                        pr.branch(),
                        pr.html_url
                    ));
                }
                text.push('\n');
            }
            Err(e) => text.push_str(&format!("Error fetching {repo}: {e}\n\n")),
        }
    }

    send_chunked(&bot, msg.chat.id, text.trim_end()).await?;
    Ok(())
}

async fn handle_suggest(
    bot: Bot,
    msg: Message,
    state: Arc<BotState>,
    arg: String,
) -> ResponseResult<()> {
    let repos = match state.target_repos(&arg) {
        Ok(repos) => repos,
        Err(reply) => {
            bot.send_message(msg.chat.id, reply).await?;
            return Ok(());
        }
    };

    let mut all_analyzed = Vec::new();
    let mut problems = String::new();
    for repo in &repos {
        match list_and_analyze(&state, repo).await {
            Ok(mut analyzed) => {
                for issue in &mut analyzed {
                    issue.repo = Some(repo.clone());
                }
                all_analyzed.extend(analyzed);
            }
            Err(e) => problems.push_str(&format!("Could not analyze {repo}: {e}\n")),
        }
    }

    let reply = match state.triage.suggest_next(&all_analyzed).await {
        Ok(suggestion) => format!("{problems}{suggestion}"),
        Err(e) => format!("{problems}Error: {e}"),
    };
    send_chunked(&bot, msg.chat.id, &reply).await?;
    Ok(())
}

/// Parse `/work` arguments: `<number>` or `<repo> <number>`.
pub fn parse_work_args(arg: &str) -> Result<(Option<String>, u64), String> {
    const USAGE: &str = "Usage: /work <number> or /work <repo> <number>";
    let parts: Vec<&str> = arg.split_whitespace().collect();
    match parts.as_slice() {
        [number] => number
            .parse()
            .map(|n| (None, n))
            .map_err(|_| USAGE.to_string()),
        [repo, number] => number
            .parse()
            .map(|n| (Some(repo.to_string()), n))
            .map_err(|_| USAGE.to_string()),
        _ => Err(USAGE.to_string()),
    }
}

/// Parse `/pr` arguments: `<number> [instructions]` or
/// `<repo> <number> [instructions]`.
pub fn parse_pr_args(arg: &str) -> Result<(Option<String>, u64, Option<String>), String> {
    const USAGE: &str = "Usage: /pr <number> [instructions] or /pr <repo> <number> [instructions]";
    let mut parts = arg.split_whitespace();
    let first = parts.next().ok_or_else(|| USAGE.to_string())?;

    let (repo, number) = match first.parse::<u64>() {
        Ok(n) => (None, n),
        Err(_) => {
            let number = parts
                .next()
                .and_then(|n| n.parse().ok())
                .ok_or_else(|| USAGE.to_string())?;
            (Some(first.to_string()), number)
        }
    };

    let rest: Vec<&str> = parts.collect();
    let instructions = if rest.is_empty() {
        None
    } else {
        Some(rest.join(" "))
    };
    Ok((repo, number, instructions))
}

/// Resolve the repo for a single-target command, handling the omitted-repo
/// form: unambiguous only when exactly one repo is configured.
fn resolve_single_repo(state: &BotState, repo_arg: Option<&str>, usage: &str) -> Result<String, String> {
    match repo_arg {
        Some(arg) => state
            .resolve_repo(arg)
            .ok_or_else(|| format!("Repo not found: {arg}. Use /repos to list them.")),
        None => {
            let repos = state.repos();
            if repos.len() == 1 {
                Ok(repos.into_iter().next().unwrap_or_default())
            } else {
                Err(format!("Multiple repos configured. {usage}"))
            }
        }
    }
}

async fn handle_work(
    bot: Bot,
    msg: Message,
    state: Arc<BotState>,
    arg: String,
) -> ResponseResult<()> {
    let (repo_arg, number) = match parse_work_args(&arg) {
        Ok(parsed) => parsed,
        Err(reply) => {
            bot.send_message(msg.chat.id, reply).await?;
            return Ok(());
        }
    };

    let repo = match resolve_single_repo(&state, repo_arg.as_deref(), "Use /work <repo> <number>.") {
        Ok(repo) => repo,
        Err(reply) => {
            bot.send_message(msg.chat.id, reply).await?;
            return Ok(());
        }
    };

    let issue = match state.github.get_issue(&repo, number).await {
        Ok(issue) => issue,
        Err(e) => {
            bot.send_message(msg.chat.id, format!("Error: {e}")).await?;
            return Ok(());
        }
    };
    if issue.is_pull_request() {
        bot.send_message(
            msg.chat.id,
            format!("#{number} is a pull request. Use /pr {number} instead."),
        )
        .await?;
        return Ok(());
    }

    let label = format!("{repo}#{number}");
    let ctx = state.work.clone();
    let task_repo = repo.clone();
    let task_issue = issue.clone();
    let submitted = state.coordinator.submit(
        label,
        state.outcome_tx.clone(),
        async move { ctx.fix_issue(&task_repo, &task_issue, None).await },
    );

    match submitted {
        Ok(()) => {
            bot.send_message(
                msg.chat.id,
                format!("Starting work on #{number}: {}", issue.title),
            )
            .await?;
        }
        Err(e) => {
            bot.send_message(msg.chat.id, e.to_string()).await?;
        }
    }
    Ok(())
}

async fn handle_pr(
    bot: Bot,
    msg: Message,
    state: Arc<BotState>,
    arg: String,
) -> ResponseResult<()> {
    let (repo_arg, number, instructions) = match parse_pr_args(&arg) {
        Ok(parsed) => parsed,
        Err(reply) => {
            bot.send_message(msg.chat.id, reply).await?;
            return Ok(());
        }
    };

    let repo = match resolve_single_repo(&state, repo_arg.as_deref(), "Use /pr <repo> <number>.") {
        Ok(repo) => repo,
        Err(reply) => {
            bot.send_message(msg.chat.id, reply).await?;
            return Ok(());
        }
    };

    let (pr, comments) = match fetch_pr(&state, &repo, number).await {
        Ok(fetched) => fetched,
        Err(e) => {
            bot.send_message(msg.chat.id, format!("Error: {e}")).await?;
            return Ok(());
        }
    };

    let label = format!("{repo} PR #{number}");
    let ctx = state.work.clone();
    let task_repo = repo.clone();
    let task_pr = pr.clone();
    let submitted = state.coordinator.submit(
        label,
        state.outcome_tx.clone(),
        async move {
            ctx.address_pr(&task_repo, &task_pr, &comments, instructions.as_deref())
                .await
        },
    );

    match submitted {
        Ok(()) => {
            bot.send_message(
                msg.chat.id,
                format!("Working on PR #{number}: {}", pr.title),
            )
            .await?;
        }
        Err(e) => {
            bot.send_message(msg.chat.id, e.to_string()).await?;
        }
    }
    Ok(())
}

async fn fetch_pr(
    state: &BotState,
    repo: &str,
    number: u64,
) -> Result<(forgebot_github::PullRequest, Vec<forgebot_github::PrComment>), String> {
    let pr = state
        .github
        .get_pr(repo, number)
        .await
        .map_err(|e| e.to_string())?;
    let comments = state
        .github
        .get_pr_comments(repo, number)
        .await
        .map_err(|e| e.to_string())?;
    Ok((pr, comments))
}

async fn handle_review(
    bot: Bot,
    msg: Message,
    state: Arc<BotState>,
    arg: String,
) -> ResponseResult<()> {
    let arg = arg.trim();
    let repo_arg = if arg.is_empty() { None } else { Some(arg) };
    let repo = match resolve_single_repo(&state, repo_arg, "Use /review <repo>.") {
        Ok(repo) => repo,
        Err(reply) => {
            bot.send_message(msg.chat.id, reply).await?;
            return Ok(());
        }
    };

    let label = format!("review {repo}");
    let ctx = state.work.clone();
    let task_repo = repo.clone();
    let submitted = state.coordinator.submit(
        label,
        state.outcome_tx.clone(),
        async move { ctx.review_codebase(&task_repo).await },
    );

    match submitted {
        Ok(()) => {
            bot.send_message(msg.chat.id, format!("Reviewing {repo}..."))
                .await?;
        }
        Err(e) => {
            bot.send_message(msg.chat.id, e.to_string()).await?;
        }
    }
    Ok(())
}

async fn handle_status(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let text = match state.coordinator.status() {
        TaskStatus::Idle => "No work in progress.".to_string(),
        TaskStatus::Running(label) => format!("Working on {label}..."),
        TaskStatus::Completed(label) => format!("Last task ({label}) completed."),
    };
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

async fn handle_repos(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let repos = state.repos();
    let text = format!("Watched repositories:\n{}", repos.join("\n"));
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn work_args_number_only() {
        assert_eq!(parse_work_args("42").unwrap(), (None, 42));
    }

    #[test]
    fn work_args_repo_and_number() {
        assert_eq!(
            parse_work_args("acme/widgets 42").unwrap(),
            (Some("acme/widgets".to_string()), 42)
        );
    }

    #[test]
    fn work_args_rejects_garbage() {
        assert!(parse_work_args("").is_err());
        assert!(parse_work_args("not-a-number").is_err());
        assert!(parse_work_args("repo 1 extra").is_err());
    }

    #[test]
    fn pr_args_number_with_instructions() {
        assert_eq!(
            parse_pr_args("7 prefer small commits").unwrap(),
            (None, 7, Some("prefer small commits".to_string()))
        );
    }

    #[test]
    fn pr_args_repo_number_no_instructions() {
        assert_eq!(
            parse_pr_args("widgets 7").unwrap(),
            (Some("widgets".to_string()), 7, None)
        );
    }

    #[test]
    fn pr_args_rejects_missing_number() {
        assert!(parse_pr_args("").is_err());
        assert!(parse_pr_args("widgets").is_err());
    }
}
