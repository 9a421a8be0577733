//! Pointbook CLI - submit activity points from the terminal
//!
//! Submissions that fail after validation are kept as local drafts and can
//! be retried, exported, or discarded later.

mod auth;
mod cli;
mod commands;
mod config_profiles;
mod error;


use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::auth_cmd::run_auth;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::drafts::run_drafts;
use crate::commands::history::run_history;
use crate::commands::retry::run_retry;
use crate::commands::submit::run_submit;
use crate::error::CliError;

const DEFAULT_LOG_FILTER: &str = "pointbook=info";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let profile = cli.profile.as_deref();
    let drafts_path = cli.drafts_path.as_deref();

    match cli.command {
        Commands::Submit(args) => run_submit(args, profile, drafts_path).await,
        Commands::Drafts { command } => run_drafts(command, profile, drafts_path),
        Commands::Retry { watch } => run_retry(watch, profile, drafts_path).await,
        Commands::History { json } => run_history(json, profile).await,
        Commands::Auth { command } => run_auth(command, profile),
        Commands::Config { command } => run_config(command, profile, drafts_path),
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref()),
    }
}
