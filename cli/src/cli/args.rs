//! Command-line argument parsing.

use clap::{Parser, Subcommand, ValueEnum};

/// Credential resolution tool for the Cloud Datastore API.
///
/// Resolves an access credential from platform identity, a configured
/// service-account key, or an interactive OAuth2 authorization, caching the
/// refresh token between runs.
#[derive(Parser, Debug)]
#[command(name = "dstore")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage authentication.
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },

    /// Generate shell completion scripts.
    ///
    /// Outputs completion script for the specified shell.
    /// Follow shell-specific instructions to install.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: ShellType,
    },
}

/// Authentication subcommands.
#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Resolve a credential, running the interactive flow if needed.
    Login {
        /// Skip opening the browser automatically.
        #[arg(long)]
        no_browser: bool,
    },

    /// Resolve a credential and print the bearer token to stdout.
    ///
    /// Intended for piping into other tools; everything else goes to
    /// stderr.
    Token {
        /// Skip opening the browser automatically.
        #[arg(long)]
        no_browser: bool,
    },

    /// Show the current authentication configuration and cache state.
    Status,

    /// Remove the cached refresh token, forcing re-authorization.
    Reset,
}

/// Supported shell types for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ShellType {
    Bash,
    Zsh,
    Fish,
}

impl From<ShellType> for clap_complete::Shell {
    fn from(shell: ShellType) -> Self {
        match shell {
            ShellType::Bash => Self::Bash,
            ShellType::Zsh => Self::Zsh,
            ShellType::Fish => Self::Fish,
        }
    }
}
