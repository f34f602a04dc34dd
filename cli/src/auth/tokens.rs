//! Credential types for authentication.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Access credential returned by credential resolution.
///
/// This is a plain data record: the bearer token, an optional refresh token,
/// and an optional expiry. It holds no HTTP client and no mutable state;
/// request signing is a separate, stateless operation ([`Credential::sign`]).
/// The caller owns the credential once returned; the resolver does not
/// retain it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    /// The bearer token presented on each RPC.
    pub access_token: String,
    /// Long-lived token used to mint new bearer tokens (if granted).
    pub refresh_token: Option<String>,
    /// When the bearer token expires.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// Creates a credential from a bearer token with optional refresh token
    /// and lifetime in seconds.
    #[must_use]
    pub fn new(
        access_token: String,
        refresh_token: Option<String>,
        expires_in_secs: Option<u64>,
    ) -> Self {
        let expires_at = expires_in_secs
            .and_then(|secs| i64::try_from(secs).ok())
            .map(|secs| Utc::now() + Duration::seconds(secs));
        Self {
            access_token,
            refresh_token,
            expires_at,
        }
    }

    /// Check if the bearer token is expired or will expire within 5 minutes.
    #[must_use]
    #[allow(dead_code)]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|exp| exp <= Utc::now() + Duration::minutes(5))
    }

    /// Check if the credential can mint new bearer tokens without operator
    /// interaction.
    #[must_use]
    pub const fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// Sign a request with this credential's bearer token.
    ///
    /// Stateless: applies the `Authorization: Bearer` header and returns the
    /// builder. The credential itself is not mutated or consumed.
    #[must_use]
    #[allow(dead_code)]
    pub fn sign(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.bearer_auth(&self.access_token)
    }
}
