//! Application configuration settings.
//!
//! Everything the resolver needs arrives through this explicit struct; no
//! component reads the environment or a global on its own. The environment
//! overrides are applied once, at load time.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::auth::platform::METADATA_URL;
use crate::config::paths;
use crate::error::Result;

/// Scopes requested when none are configured.
const DEFAULT_SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/datastore",
    "https://www.googleapis.com/auth/userinfo.email",
];

/// Main configuration for dstore.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DstoreConfig {
    /// Authentication settings.
    pub auth: AuthConfig,
    /// Platform-identity probe settings.
    pub platform: PlatformConfig,
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Path to the OAuth client-secrets JSON. Defaults to
    /// `client_secrets.json` in the config directory.
    pub secrets_file: Option<PathBuf>,
    /// Path of the refresh-token cache. Defaults to `token.dat` in the
    /// config directory.
    pub token_file: Option<PathBuf>,
    /// Scopes requested from the authorization endpoint.
    pub scopes: Vec<String>,
    /// Service-account key settings.
    pub service_account: ServiceAccountConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secrets_file: None,
            token_file: None,
            scopes: DEFAULT_SCOPES.iter().map(ToString::to_string).collect(),
            service_account: ServiceAccountConfig::default(),
        }
    }
}

impl AuthConfig {
    /// The effective client-secrets path.
    pub fn secrets_path(&self) -> Result<PathBuf> {
        match &self.secrets_file {
            Some(path) => Ok(path.clone()),
            None => paths::default_secrets_file(),
        }
    }

    /// The effective refresh-token cache path.
    pub fn token_path(&self) -> Result<PathBuf> {
        match &self.token_file {
            Some(path) => Ok(path.clone()),
            None => paths::default_token_file(),
        }
    }
}

/// Service-account key configuration. Both fields must be set for the
/// source to be usable; a half-configured pair is reported and skipped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceAccountConfig {
    /// Service-account identifier (the `...@....iam.gserviceaccount.com`
    /// email).
    pub account_id: Option<String>,
    /// Path to the account's private-key PEM file.
    pub key_file: Option<PathBuf>,
}

impl ServiceAccountConfig {
    /// Whether any part of the pair is configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.account_id.is_some() || self.key_file.is_some()
    }
}

/// Platform-identity probe configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Whether to probe the metadata server at all.
    pub enabled: bool,
    /// Metadata server base URL.
    #[serde(with = "url_serde")]
    pub metadata_url: Url,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            metadata_url: Url::parse(METADATA_URL).expect("valid default URL"),
        }
    }
}

/// Custom serde module for URL serialization.
mod url_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use url::Url;

    pub fn serialize<S>(url: &Url, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(url.as_str())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Url, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Url::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Environment variables that can override configuration.
pub mod env {
    pub const SERVICE_ACCOUNT: &str = "DSTORE_SERVICE_ACCOUNT";
    pub const PRIVATE_KEY_FILE: &str = "DSTORE_PRIVATE_KEY_FILE";
    pub const METADATA_URL: &str = "DSTORE_METADATA_URL";
    pub const LOG_LEVEL: &str = "DSTORE_LOG";
}

impl DstoreConfig {
    /// Apply environment variable overrides to the configuration.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(account) = std::env::var(env::SERVICE_ACCOUNT) {
            self.auth.service_account.account_id = Some(account);
        }

        if let Ok(key_file) = std::env::var(env::PRIVATE_KEY_FILE) {
            self.auth.service_account.key_file = Some(PathBuf::from(key_file));
        }

        if let Ok(url) = std::env::var(env::METADATA_URL) {
            if let Ok(parsed) = Url::parse(&url) {
                self.platform.metadata_url = parsed;
            }
        }

        self
    }
}
