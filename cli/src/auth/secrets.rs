//! OAuth client secrets loaded from a `client_secrets.json` file.
//!
//! The file uses the installed-application layout produced by the cloud
//! console: a top-level `"installed"` object holding the client id, client
//! secret, endpoint URIs, and authorized redirect URIs. It must exist before
//! any interactive or refresh exchange; its absence aborts the process
//! rather than falling through to another credential source.

use std::path::Path;

use serde::Deserialize;

use crate::error::{DstoreError, Result};

/// Out-of-band redirect: the provider displays the authorization code for
/// the operator to copy instead of redirecting to a local listener.
pub const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Parsed client-secrets document.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    /// The installed-application section.
    pub installed: InstalledSecrets,
}

/// The `"installed"` section of a client-secrets file.
#[derive(Debug, Clone, Deserialize)]
pub struct InstalledSecrets {
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Authorization endpoint.
    pub auth_uri: String,
    /// Token endpoint.
    pub token_uri: String,
    /// Authorized redirect URIs; the first entry is used.
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

impl ClientSecrets {
    /// Loads client secrets from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`DstoreError::MissingClientSecrets`] if the file does not
    /// exist or cannot be read, and a serialization error if it exists but
    /// does not parse.
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|_| DstoreError::MissingClientSecrets {
                path: path.to_path_buf(),
            })?;
        let secrets: Self = serde_json::from_str(&contents)?;
        Ok(secrets)
    }

    /// The redirect URI to use for the authorization-code flow.
    ///
    /// Falls back to the out-of-band URI when the file lists none.
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        self.installed
            .redirect_uris
            .first()
            .map_or(OOB_REDIRECT_URI, String::as_str)
    }
}
