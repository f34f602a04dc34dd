//! CLI module for dstore.

pub mod args;
pub mod commands;

pub use args::{AuthCommands, Cli, Commands, ShellType};
