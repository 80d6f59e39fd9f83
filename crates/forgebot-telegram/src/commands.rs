//! Bot commands.

use teloxide::utils::command::BotCommands;

/// Commands the bound chat can invoke with `/`.
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Claim the bot and show help")]
    Start,

    #[command(description = "Show help message")]
    Help,

    #[command(description = "List open issues with estimates: /issues [repo]")]
    Issues(String),

    #[command(description = "List open pull requests: /prs [repo]")]
    Prs(String),

    #[command(description = "Suggest what to work on next: /suggest [repo]")]
    Suggest(String),

    #[command(description = "Work on an issue: /work <number> or /work <repo> <number>")]
    Work(String),

    #[command(description = "Address PR review comments: /pr <number> [instructions]")]
    Pr(String),

    #[command(description = "Review a codebase and file issues: /review [repo]")]
    Review(String),

    #[command(description = "Show current work status")]
    Status,

    #[command(description = "List watched repositories")]
    Repos,
}
