//! Configuration management for dstore.

pub mod paths;
pub mod settings;

pub use settings::DstoreConfig;

use std::path::Path;

use crate::error::Result;

/// Load configuration from the default config file.
///
/// If the config file doesn't exist, returns default configuration.
pub fn load_config() -> Result<DstoreConfig> {
    let path = paths::config_file()?;
    load_config_from(&path)
}

/// Load configuration from a specific path.
///
/// If the file doesn't exist, returns default configuration.
pub fn load_config_from(path: &Path) -> Result<DstoreConfig> {
    if !path.exists() {
        return Ok(DstoreConfig::default().with_env_overrides());
    }

    let contents = std::fs::read_to_string(path)?;
    let config: DstoreConfig = toml::from_str(&contents)?;

    Ok(config.with_env_overrides())
}

/// Save configuration to a specific path.
#[allow(dead_code)]
pub fn save_config_to(config: &DstoreConfig, path: &Path) -> Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_config_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config_from(&dir.path().join("config.toml")).unwrap();
        assert!(config.platform.enabled);
        assert!(config.auth.service_account.account_id.is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = DstoreConfig::default();
        config.auth.service_account.account_id = Some("sa@example.iam".to_string());
        save_config_to(&config, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(
            loaded.auth.service_account.account_id.as_deref(),
            Some("sa@example.iam")
        );
    }

    #[test]
    fn malformed_config_is_read_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "auth = 7").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, crate::error::DstoreError::ConfigRead(_)));
    }
}
