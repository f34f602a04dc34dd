//! dstore - Cloud Datastore credential resolution CLI
//!
//! Resolves an access credential from platform identity, a configured
//! service-account key, or an interactive OAuth2 authorization-code grant,
//! caching the refresh token on disk between runs.

mod auth;
mod cli;
mod config;
mod error;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::{AuthCommands, Cli, Commands};
use crate::config::settings::env;
use crate::error::Result;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(env::LOG_LEVEL).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Run the command
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Auth { command } => match command {
            AuthCommands::Login { no_browser } => cli::commands::handle_login(no_browser).await,
            AuthCommands::Token { no_browser } => cli::commands::handle_token(no_browser).await,
            AuthCommands::Status => cli::commands::handle_status().await,
            AuthCommands::Reset => cli::commands::handle_reset().await,
        },
        Commands::Completions { shell } => {
            clap_complete::generate(
                clap_complete::Shell::from(shell),
                &mut Cli::command(),
                "dstore",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    }
}
