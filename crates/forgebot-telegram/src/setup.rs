//! Interactive first-time setup.
//!
//! Prompts for tokens and the repo list, then writes the config file. The
//! bot refuses to start without it.

use std::io::{self, BufRead, Write};

use forgebot_core::{paths, Config};

use crate::error::Result;

fn prompt(label: &str) -> io::Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Run interactive setup. Returns an error exit if no repo was provided.
pub fn run() -> Result<()> {
    println!("forgebot setup\n");

    let github_token = prompt("GitHub token")?;
    let telegram_token = prompt("Telegram bot token")?;
    let anthropic_key = prompt("Anthropic API key (empty to use the local agent CLI)")?;

    println!("\nAdd GitHub repos (owner/repo format). Empty line to finish.");
    let mut repos = Vec::new();
    loop {
        let repo = prompt("  repo")?;
        if repo.is_empty() {
            break;
        }
        repos.push(repo);
    }

    if repos.is_empty() {
        eprintln!("At least one repo is required.");
        std::process::exit(1);
    }

    let mut config = Config::new(telegram_token, github_token, repos);
    if !anthropic_key.is_empty() {
        config.anthropic_api_key = Some(anthropic_key);
    }

    paths::ensure_all_dirs()?;
    config.save()?;

    println!("\nConfig saved to {}", paths::config_file().display());
    println!("Start the bot and send /start in Telegram to complete setup.");
    Ok(())
}
