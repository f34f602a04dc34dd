//! Credential source selection.
//!
//! The resolver walks an ordered list of credential sources and returns the
//! first usable credential. This is a priority list, not a race: sources
//! are tried strictly sequentially, never concurrently, since each attempt
//! may have side effects (file reads, network calls) that must not overlap.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::auth::exchanger::{AuthorizationCodeExchanger, AuthorizationCodeProvider};
use crate::auth::secrets::ClientSecrets;
use crate::auth::token_store::RefreshTokenStore;
use crate::auth::tokens::Credential;
use crate::auth::{platform, service_account};
use crate::config::DstoreConfig;
use crate::error::{DstoreError, Result};

/// A candidate way of obtaining a credential, in resolver priority order.
#[derive(Debug)]
pub enum CredentialSource {
    /// Instance identity from the metadata server; zero configuration, no
    /// secrets needed.
    PlatformIdentity,
    /// Explicit service-account key. Fields are optional so a
    /// half-configured pair is detected and reported at resolve time.
    ServiceAccountKey {
        /// Service-account identifier.
        account_id: Option<String>,
        /// Path to the private-key PEM file.
        key_file: Option<PathBuf>,
    },
    /// Interactive authorization-code grant; the unconditional fallback.
    InteractiveAuthorizationCode {
        /// Loaded OAuth client secrets.
        secrets: ClientSecrets,
        /// Scopes to request.
        scopes: Vec<String>,
    },
}

impl CredentialSource {
    /// Assembles the source list from configuration, in priority order:
    /// platform identity, service-account key, interactive fallback.
    ///
    /// The service-account source is included whenever any part of its pair
    /// is configured, so a half-configured pair surfaces as a warning during
    /// resolution instead of silently vanishing.
    ///
    /// # Errors
    ///
    /// Returns [`DstoreError::MissingClientSecrets`] if the client-secrets
    /// file is absent. This aborts before any resolution: the interactive
    /// fallback could never run without it.
    pub fn from_config(config: &DstoreConfig) -> Result<Vec<Self>> {
        let mut sources = Vec::new();

        if config.platform.enabled {
            sources.push(Self::PlatformIdentity);
        }

        let sa = &config.auth.service_account;
        if sa.is_configured() {
            sources.push(Self::ServiceAccountKey {
                account_id: sa.account_id.clone(),
                key_file: sa.key_file.clone(),
            });
        }

        let secrets = ClientSecrets::load(&config.auth.secrets_path()?)?;
        sources.push(Self::InteractiveAuthorizationCode {
            secrets,
            scopes: config.auth.scopes.clone(),
        });

        Ok(sources)
    }

    const fn describe(&self) -> &'static str {
        match self {
            Self::PlatformIdentity => "platform identity",
            Self::ServiceAccountKey { .. } => "service-account key",
            Self::InteractiveAuthorizationCode { .. } => "interactive authorization",
        }
    }
}

/// Resolves a credential by trying sources in order.
pub struct CredentialResolver {
    http: reqwest::Client,
    metadata_url: Url,
    token_uri: String,
    scopes: Vec<String>,
    store: Box<dyn RefreshTokenStore>,
    code_provider: Box<dyn AuthorizationCodeProvider>,
}

impl CredentialResolver {
    /// Creates a resolver with injected persistence and operator-input
    /// capabilities.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        config: &DstoreConfig,
        store: Box<dyn RefreshTokenStore>,
        code_provider: Box<dyn AuthorizationCodeProvider>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(format!("dstore/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            metadata_url: config.platform.metadata_url.clone(),
            token_uri: service_account::TOKEN_URI.to_string(),
            scopes: config.auth.scopes.clone(),
            store,
            code_provider,
        })
    }

    /// Overrides the service-account token endpoint (primarily for tests).
    #[must_use]
    pub fn with_token_uri(mut self, token_uri: String) -> Self {
        self.token_uri = token_uri;
        self
    }

    /// Returns the first credential a source yields.
    ///
    /// Sources are attempted strictly in order and a failed source is never
    /// re-attempted within the same call. A misconfigured service account is
    /// reported and skipped; a rejected authorization code or stored refresh
    /// token is surfaced as-is, with no automatic retry or fallback.
    ///
    /// # Errors
    ///
    /// Returns [`DstoreError::NoCredentialAvailable`] when the interactive
    /// fallback itself fails for any reason other than a rejected grant or a
    /// persistence failure, which keep their own variants.
    pub async fn resolve(&self, sources: &[CredentialSource]) -> Result<Credential> {
        for source in sources {
            tracing::debug!(source = source.describe(), "attempting credential source");
            match self.attempt(source).await {
                Ok(Some(credential)) => {
                    tracing::info!(source = source.describe(), "credential resolved");
                    return Ok(credential);
                }
                Ok(None) => {
                    tracing::debug!(source = source.describe(), "credential source not available");
                }
                Err(err)
                    if err.is_fatal()
                        || err.requires_reauth()
                        || matches!(err, DstoreError::Persistence { .. }) =>
                {
                    return Err(err);
                }
                Err(err) if err.skips_source() => {
                    tracing::warn!(
                        source = source.describe(),
                        error = %err,
                        "skipping misconfigured source"
                    );
                }
                Err(err) => {
                    if matches!(source, CredentialSource::InteractiveAuthorizationCode { .. }) {
                        return Err(DstoreError::NoCredentialAvailable(err.to_string()));
                    }
                    tracing::warn!(
                        source = source.describe(),
                        error = %err,
                        "credential source failed, trying next"
                    );
                }
            }
        }

        Err(DstoreError::NoCredentialAvailable(
            "all credential sources exhausted".to_string(),
        ))
    }

    async fn attempt(&self, source: &CredentialSource) -> Result<Option<Credential>> {
        match source {
            CredentialSource::PlatformIdentity => {
                platform::fetch(&self.http, &self.metadata_url).await
            }
            CredentialSource::ServiceAccountKey {
                account_id,
                key_file,
            } => {
                let (account, key) =
                    service_account::validate(account_id.as_deref(), key_file.as_deref())?;
                service_account::mint(&self.http, &account, &key, &self.scopes, &self.token_uri)
                    .await
                    .map(Some)
            }
            CredentialSource::InteractiveAuthorizationCode { secrets, scopes } => {
                let exchanger = AuthorizationCodeExchanger::new(secrets, scopes)?;
                exchanger
                    .obtain(self.store.as_ref(), self.code_provider.as_ref())
                    .await
                    .map(Some)
            }
        }
    }
}
