//! forgebot binary.
//!
//! Run setup once, then start the bot:
//! ```bash
//! forgebot setup
//! forgebot
//! ```

use clap::{Parser, Subcommand};
use forgebot_core::{paths, Config};
use forgebot_telegram::ForgeBot;
use tracing_subscriber::EnvFilter;

/// Telegram bot that triages GitHub issues and drives a coding agent.
#[derive(Parser, Debug)]
#[command(name = "forgebot")]
#[command(about = "Telegram-driven GitHub triage and coding-agent bot")]
struct Args {
    #[command(subcommand)]
    command: Option<Cmd>,

    /// Verbose logging (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Interactive first-time setup
    Setup,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Pick up secrets from a local env file if present.
    let _ = dotenvy::dotenv();

    let filter = match args.verbose {
        0 => "info,teloxide=warn,reqwest=warn,hyper=warn",
        1 => "debug,teloxide=info,reqwest=info,hyper=info",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Some(Cmd::Setup) = args.command {
        forgebot_telegram::setup::run()?;
        return Ok(());
    }

    // Missing or invalid config is fatal; the error names the path and the
    // setup command.
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = paths::ensure_all_dirs() {
        tracing::warn!(error = %e, "Failed to create state directories");
    }

    tracing::info!(repos = config.repos.len(), "Starting forgebot");
    let bot = ForgeBot::from_config(config)?;
    bot.run().await?;

    Ok(())
}
