//! Platform-specific path utilities for dstore.

use std::path::PathBuf;

use crate::error::{DstoreError, Result};

/// Get the configuration directory for dstore.
///
/// - Linux: `~/.config/dstore`
/// - macOS: `~/Library/Application Support/dstore`
/// - Windows: `%APPDATA%\dstore`
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir()
        .ok_or_else(|| DstoreError::Config("Cannot determine config directory".to_string()))?;
    Ok(base.join("dstore"))
}

/// Get the main configuration file path.
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Default location of the OAuth client-secrets JSON.
pub fn default_secrets_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("client_secrets.json"))
}

/// Default location of the cached refresh token.
pub fn default_token_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("token.dat"))
}

/// Ensure the configuration directory exists.
pub fn ensure_config_dir() -> Result<PathBuf> {
    let dir = config_dir()?;
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(dir)
}
