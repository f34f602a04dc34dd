//! OAuth2 authorization-code exchange and refresh-token renewal.
//!
//! Two paths, selected by whether a refresh token is already stored:
//! - no stored token: build an authorization URL, wait for the operator to
//!   paste back the code, exchange it at the token endpoint, persist the
//!   granted refresh token;
//! - stored token: perform a non-interactive refresh at the token endpoint.
//!   The code provider is never invoked on this path.
//!
//! The operator-input wait is the single suspension point in the whole
//! subsystem: it has no timeout and blocks until input arrives or the
//! process is terminated externally.

use async_trait::async_trait;
use oauth2::basic::{BasicClient, BasicErrorResponseType};
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, RefreshToken,
    RequestTokenError, Scope, StandardErrorResponse, TokenResponse, TokenUrl,
};
use url::Url;

use crate::auth::secrets::ClientSecrets;
use crate::auth::token_store::RefreshTokenStore;
use crate::auth::tokens::Credential;
use crate::error::{DstoreError, Result};

type TokenRequestError<RE> = RequestTokenError<RE, StandardErrorResponse<BasicErrorResponseType>>;

/// Source of the pasted authorization code.
///
/// Injected capability so tests can supply codes without real terminal
/// interaction; production uses [`ConsoleCodeProvider`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthorizationCodeProvider: Send + Sync {
    /// Presents the authorization URL to the operator and returns the code
    /// they obtained out-of-band. May block indefinitely.
    async fn authorization_code(&self, authorize_url: &Url) -> Result<String>;
}

/// Code provider backed by the terminal: prints the authorization URL,
/// optionally opens the browser, and reads the pasted code from stdin.
pub struct ConsoleCodeProvider {
    no_browser: bool,
}

impl ConsoleCodeProvider {
    /// Creates a console provider.
    ///
    /// With `no_browser` set, the URL is only printed, never opened.
    #[must_use]
    pub const fn new(no_browser: bool) -> Self {
        Self { no_browser }
    }
}

#[async_trait]
impl AuthorizationCodeProvider for ConsoleCodeProvider {
    async fn authorization_code(&self, authorize_url: &Url) -> Result<String> {
        // Prompts go to stderr so 'auth token' output stays pipeable.
        eprintln!("To authorize access, visit:");
        eprintln!();
        eprintln!("  {authorize_url}");
        eprintln!();

        if !self.no_browser {
            if open::that(authorize_url.as_str()).is_ok() {
                eprintln!("Browser opened automatically.");
            } else {
                eprintln!("Could not open browser. Please visit the URL manually.");
            }
            eprintln!();
        }

        eprint!("Paste the authorization code here: ");
        use std::io::Write;
        std::io::stderr().flush()?;

        // Blocking read with no timeout; the operator may take as long as
        // they need.
        let line = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).map(|_| line)
        })
        .await
        .map_err(|e| DstoreError::Config(format!("stdin reader task failed: {e}")))??;

        Ok(line.trim().to_string())
    }
}

/// Talks to the OAuth2 authorization and token endpoints for one client.
pub struct AuthorizationCodeExchanger {
    oauth: BasicClient,
    scopes: Vec<Scope>,
}

impl AuthorizationCodeExchanger {
    /// Builds an exchanger from loaded client secrets and requested scopes.
    ///
    /// # Errors
    ///
    /// Returns an error if any endpoint or redirect URI in the secrets file
    /// fails to parse.
    pub fn new(secrets: &ClientSecrets, scopes: &[String]) -> Result<Self> {
        let installed = &secrets.installed;
        let oauth = BasicClient::new(
            ClientId::new(installed.client_id.clone()),
            Some(ClientSecret::new(installed.client_secret.clone())),
            AuthUrl::new(installed.auth_uri.clone())?,
            Some(TokenUrl::new(installed.token_uri.clone())?),
        )
        .set_redirect_uri(RedirectUrl::new(secrets.redirect_uri().to_string())?);

        Ok(Self {
            oauth,
            scopes: scopes.iter().cloned().map(Scope::new).collect(),
        })
    }

    /// The browser-navigable authorization URL embedding client id, redirect
    /// URI, and requested scopes.
    #[must_use]
    pub fn authorize_url(&self) -> Url {
        let mut request = self.oauth.authorize_url(CsrfToken::new_random);
        for scope in &self.scopes {
            request = request.add_scope(scope.clone());
        }
        // Offline access so the grant includes a refresh token; forced
        // consent so repeat grants keep returning one.
        let (url, _csrf) = request
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .url();
        url
    }

    /// Obtains a credential, refreshing the stored token when one exists
    /// and running the interactive flow otherwise.
    ///
    /// A stored token that the endpoint rejects surfaces as
    /// [`DstoreError::RefreshTokenInvalid`]; it is not demoted to the
    /// interactive path. The operator clears the store to re-authorize.
    ///
    /// # Errors
    ///
    /// See [`exchange`](Self::exchange) and [`refresh`](Self::refresh).
    pub async fn obtain(
        &self,
        store: &dyn RefreshTokenStore,
        provider: &dyn AuthorizationCodeProvider,
    ) -> Result<Credential> {
        match store.load()? {
            Some(stored) => self.refresh(&stored, store).await,
            None => self.exchange(store, provider).await,
        }
    }

    /// Interactive path: await the operator's code, exchange it, persist
    /// the granted refresh token.
    ///
    /// # Errors
    ///
    /// Returns [`DstoreError::AuthorizationDenied`] if the endpoint rejects
    /// the code (the store is left untouched), or
    /// [`DstoreError::Persistence`] if the exchange succeeded but the
    /// refresh token could not be written.
    pub async fn exchange(
        &self,
        store: &dyn RefreshTokenStore,
        provider: &dyn AuthorizationCodeProvider,
    ) -> Result<Credential> {
        let authorize_url = self.authorize_url();
        tracing::debug!("awaiting operator authorization code");
        let code = provider.authorization_code(&authorize_url).await?;

        tracing::debug!("exchanging authorization code");
        let response = self
            .oauth
            .exchange_code(AuthorizationCode::new(code.trim().to_string()))
            .request_async(async_http_client)
            .await
            .map_err(map_exchange_error)?;

        let refresh_token = response.refresh_token().map(|t| t.secret().clone());
        if let Some(token) = refresh_token.as_deref() {
            store.save(token)?;
        }

        tracing::info!("authorization granted");
        Ok(Credential::new(
            response.access_token().secret().clone(),
            refresh_token,
            response.expires_in().map(|d| d.as_secs()),
        ))
    }

    /// Non-interactive path: mint a new bearer token from the stored
    /// refresh token.
    ///
    /// If the endpoint rotates the refresh token, the new one replaces the
    /// stored one.
    ///
    /// # Errors
    ///
    /// Returns [`DstoreError::RefreshTokenInvalid`] if the endpoint rejects
    /// the stored token (e.g. revoked externally).
    pub async fn refresh(
        &self,
        stored: &str,
        store: &dyn RefreshTokenStore,
    ) -> Result<Credential> {
        tracing::debug!("refreshing stored token");
        let response = self
            .oauth
            .exchange_refresh_token(&RefreshToken::new(stored.trim().to_string()))
            .request_async(async_http_client)
            .await
            .map_err(map_refresh_error)?;

        let refresh_token = match response.refresh_token() {
            Some(rotated) => {
                store.save(rotated.secret())?;
                Some(rotated.secret().clone())
            }
            None => Some(stored.to_string()),
        };

        tracing::info!("bearer token refreshed");
        Ok(Credential::new(
            response.access_token().secret().clone(),
            refresh_token,
            response.expires_in().map(|d| d.as_secs()),
        ))
    }
}

/// Any server-side rejection of the code exchange counts as a denied
/// authorization; transport failures stay network errors. Generic over the
/// transport error type, which the oauth2 crate picks.
fn map_exchange_error<RE: std::error::Error + 'static>(err: TokenRequestError<RE>) -> DstoreError {
    match err {
        RequestTokenError::ServerResponse(response) => {
            DstoreError::AuthorizationDenied(response.to_string())
        }
        RequestTokenError::Parse(e, _) => DstoreError::Serialization(e.to_string()),
        other => DstoreError::Network(other.to_string()),
    }
}

fn map_refresh_error<RE: std::error::Error + 'static>(err: TokenRequestError<RE>) -> DstoreError {
    match err {
        RequestTokenError::ServerResponse(_) => DstoreError::RefreshTokenInvalid,
        RequestTokenError::Parse(e, _) => DstoreError::Serialization(e.to_string()),
        other => DstoreError::Network(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::secrets::InstalledSecrets;
    use crate::auth::token_store::FileRefreshTokenStore;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn secrets_for(server_uri: &str) -> ClientSecrets {
        ClientSecrets {
            installed: InstalledSecrets {
                client_id: "test-client".to_string(),
                client_secret: "test-secret".to_string(),
                auth_uri: format!("{server_uri}/auth"),
                token_uri: format!("{server_uri}/token"),
                redirect_uris: vec!["urn:ietf:wg:oauth:2.0:oob".to_string()],
            },
        }
    }

    fn exchanger_for(server_uri: &str) -> AuthorizationCodeExchanger {
        AuthorizationCodeExchanger::new(
            &secrets_for(server_uri),
            &["https://www.googleapis.com/auth/datastore".to_string()],
        )
        .unwrap()
    }

    fn file_store(dir: &TempDir) -> FileRefreshTokenStore {
        FileRefreshTokenStore::new(dir.path().join("token.dat"))
    }

    #[test]
    fn authorize_url_embeds_client_and_scopes() {
        let exchanger = exchanger_for("https://example.invalid");
        let url = exchanger.authorize_url().to_string();

        assert!(url.starts_with("https://example.invalid/auth"));
        assert!(url.contains("client_id=test-client"));
        assert!(url.contains("redirect_uri="));
        assert!(url.contains("datastore"));
        assert!(url.contains("access_type=offline"));
    }

    #[tokio::test]
    async fn valid_code_authorizes_and_persists_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("authorization_code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "new-bearer",
                "token_type": "bearer",
                "refresh_token": "new-refresh",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let store = file_store(&dir);
        let mut provider = MockAuthorizationCodeProvider::new();
        provider
            .expect_authorization_code()
            .times(1)
            .returning(|_| Ok("pasted-code".to_string()));

        let exchanger = exchanger_for(&server.uri());
        let credential = exchanger.obtain(&store, &provider).await.unwrap();

        assert_eq!(credential.access_token, "new-bearer");
        assert_eq!(credential.refresh_token.as_deref(), Some("new-refresh"));
        assert!(!credential.is_expired());
        assert_eq!(store.load().unwrap().as_deref(), Some("new-refresh"));
    }

    #[tokio::test]
    async fn rejected_code_is_authorization_denied_and_store_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })),
            )
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let store = file_store(&dir);
        let mut provider = MockAuthorizationCodeProvider::new();
        provider
            .expect_authorization_code()
            .times(1)
            .returning(|_| Ok("stale-code".to_string()));

        let exchanger = exchanger_for(&server.uri());
        let err = exchanger.obtain(&store, &provider).await.unwrap_err();

        assert!(matches!(err, DstoreError::AuthorizationDenied(_)));
        // No partial write.
        assert!(store.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn unwritable_store_after_successful_exchange_is_persistence_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "new-bearer",
                "token_type": "bearer",
                "refresh_token": "new-refresh",
                "expires_in": 3600
            })))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        // Parent directory does not exist, so the save must fail.
        let store = FileRefreshTokenStore::new(dir.path().join("no-such-dir").join("token.dat"));
        let mut provider = MockAuthorizationCodeProvider::new();
        provider
            .expect_authorization_code()
            .times(1)
            .returning(|_| Ok("pasted-code".to_string()));

        let exchanger = exchanger_for(&server.uri());
        let err = exchanger.obtain(&store, &provider).await.unwrap_err();

        // The exchange succeeded but the token could not be cached; no
        // credential is handed out.
        assert!(matches!(err, DstoreError::Persistence { .. }));
    }

    #[tokio::test]
    async fn stored_token_refreshes_without_prompting() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "refreshed-bearer",
                "token_type": "bearer",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let store = file_store(&dir);
        store.save("cached-refresh").unwrap();

        // No expectations: any prompt would panic the test.
        let provider = MockAuthorizationCodeProvider::new();

        let exchanger = exchanger_for(&server.uri());
        let credential = exchanger.obtain(&store, &provider).await.unwrap();

        assert_eq!(credential.access_token, "refreshed-bearer");
        // The stored token is carried forward when the endpoint does not
        // rotate it.
        assert_eq!(credential.refresh_token.as_deref(), Some("cached-refresh"));
        assert_eq!(store.load().unwrap().as_deref(), Some("cached-refresh"));
    }

    #[tokio::test]
    async fn rotated_refresh_token_replaces_stored_one() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "refreshed-bearer",
                "token_type": "bearer",
                "refresh_token": "rotated-refresh",
                "expires_in": 3600
            })))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let store = file_store(&dir);
        store.save("cached-refresh").unwrap();

        let provider = MockAuthorizationCodeProvider::new();
        let exchanger = exchanger_for(&server.uri());
        exchanger.obtain(&store, &provider).await.unwrap();

        assert_eq!(store.load().unwrap().as_deref(), Some("rotated-refresh"));
    }

    #[tokio::test]
    async fn rejected_stored_token_is_refresh_token_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })),
            )
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let store = file_store(&dir);
        store.save("revoked-refresh").unwrap();

        let provider = MockAuthorizationCodeProvider::new();
        let exchanger = exchanger_for(&server.uri());
        let err = exchanger.obtain(&store, &provider).await.unwrap_err();

        assert!(matches!(err, DstoreError::RefreshTokenInvalid));
        // Not demoted to the interactive path and not deleted; the operator
        // resets explicitly.
        assert_eq!(store.load().unwrap().as_deref(), Some("revoked-refresh"));
    }

    #[tokio::test]
    async fn exchange_without_granted_refresh_token_skips_persistence() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "bearer-only",
                "token_type": "bearer",
                "expires_in": 3600
            })))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let store = file_store(&dir);
        let mut provider = MockAuthorizationCodeProvider::new();
        provider
            .expect_authorization_code()
            .times(1)
            .returning(|_| Ok("code".to_string()));

        let exchanger = exchanger_for(&server.uri());
        let credential = exchanger.obtain(&store, &provider).await.unwrap();

        assert_eq!(credential.access_token, "bearer-only");
        assert!(credential.refresh_token.is_none());
        assert!(store.load().unwrap().is_none());
    }
}
