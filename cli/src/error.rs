//! Error types and result aliases for dstore.
//!
//! This module provides the error taxonomy for credential resolution:
//! - Specific error variants for each failure mode of the flow
//! - User-friendly error messages with recovery suggestions
//! - Helper methods for error classification
//! - Automatic conversion from common error types

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for dstore operations.
///
/// Each variant includes a user-friendly message with actionable recovery
/// steps. Use [`is_fatal`](Self::is_fatal), [`skips_source`](Self::skips_source)
/// and [`requires_reauth`](Self::requires_reauth) to determine how the
/// resolver and the CLI react to a given failure.
#[derive(Error, Debug)]
pub enum DstoreError {
    /// The client-secrets file is missing or unreadable. Nothing in the
    /// interactive or refresh paths can proceed without it.
    #[error("Client secrets not found at '{path}'. Download the OAuth client JSON from the cloud console and place it there, or set [auth].secrets_file in the config.")]
    MissingClientSecrets {
        /// Where the secrets file was expected.
        path: PathBuf,
    },

    /// The service-account source is half-configured (only one of account id
    /// and key file present) or its key file cannot be read.
    #[error("Invalid service-account configuration: {0}. Set both DSTORE_SERVICE_ACCOUNT and DSTORE_PRIVATE_KEY_FILE, or neither.")]
    InvalidServiceAccountConfig(String),

    /// The token endpoint rejected the pasted authorization code.
    #[error("Authorization was denied: {0}. Run 'dstore auth login' again and paste a fresh code.")]
    AuthorizationDenied(String),

    /// The token endpoint rejected the stored refresh token (revoked or
    /// expired externally).
    #[error("The stored refresh token was rejected. Run 'dstore auth reset' and then 'dstore auth login' to re-authorize.")]
    RefreshTokenInvalid,

    /// Writing the refresh token to disk failed. The credential obtained in
    /// this run may still be usable, but it will not survive to the next run.
    #[error("Failed to persist refresh token to '{path}': {source}. Check directory permissions.")]
    Persistence {
        /// The token-store path that could not be written.
        path: PathBuf,
        /// The underlying IO failure.
        source: std::io::Error,
    },

    /// Every credential source failed, including the interactive fallback.
    #[error("No credential available: {0}")]
    NoCredentialAvailable(String),

    /// Network error while talking to an auth endpoint.
    #[error("Network error: {0}. Check your internet connection.")]
    Network(String),

    /// Request to an auth endpoint timed out.
    #[error("Request timed out. The auth endpoint may be slow or unreachable. Try again later.")]
    Timeout,

    /// General configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to read configuration file.
    #[error("Failed to read configuration file: {0}. Check file permissions and format.")]
    ConfigRead(String),

    /// Failed to write configuration file.
    #[error("Failed to write configuration file: {0}. Check directory permissions.")]
    ConfigWrite(String),

    /// IO operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON or TOML serialization/deserialization failed.
    #[error("Data serialization error: {0}. This may indicate corrupted data.")]
    Serialization(String),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl DstoreError {
    /// Checks if this error aborts the whole process before resolution.
    ///
    /// Missing client secrets are a configuration error, not a failed
    /// credential source; no fallback can recover from them.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::MissingClientSecrets { .. })
    }

    /// Checks if the resolver should skip the failing source and continue
    /// with the next one.
    #[must_use]
    pub const fn skips_source(&self) -> bool {
        matches!(self, Self::InvalidServiceAccountConfig(_))
    }

    /// Checks if this error can only be resolved by re-authorizing.
    ///
    /// Returns `true` for rejected authorization codes and rejected stored
    /// refresh tokens. Neither is retried or demoted automatically; the
    /// operator restarts the flow.
    #[must_use]
    pub const fn requires_reauth(&self) -> bool {
        matches!(self, Self::AuthorizationDenied(_) | Self::RefreshTokenInvalid)
    }
}

/// Result type alias using [`DstoreError`].
pub type Result<T> = std::result::Result<T, DstoreError>;

impl From<serde_json::Error> for DstoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(format!("JSON error: {err}"))
    }
}

impl From<toml::de::Error> for DstoreError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigRead(format!("TOML parse error: {err}"))
    }
}

impl From<toml::ser::Error> for DstoreError {
    fn from(err: toml::ser::Error) -> Self {
        Self::ConfigWrite(format!("TOML serialize error: {err}"))
    }
}

impl From<reqwest::Error> for DstoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err.to_string())
        }
    }
}
