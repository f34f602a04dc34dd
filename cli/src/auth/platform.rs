//! Platform-provided identity via the instance metadata server.
//!
//! On a trusted host the metadata server hands out bearer tokens for the
//! instance's default service account with no secrets involved. Off the
//! platform the probe simply finds nothing: unreachable, non-success, and
//! undecodable responses all mean "not available here", never an error, so
//! resolution continues with the next source.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::auth::tokens::Credential;
use crate::error::Result;

/// Default metadata server, resolvable only from inside the platform.
pub const METADATA_URL: &str = "http://metadata.google.internal";

const TOKEN_PATH: &str = "computeMetadata/v1/instance/service-accounts/default/token";

/// Keep the probe short: off the platform the hostname usually fails fast,
/// but a firewalled environment may blackhole the connection instead.
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
struct MetadataTokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

/// Probes the metadata server for a platform-provided credential.
///
/// # Errors
///
/// Only fails if the probe URL cannot be constructed; any runtime condition
/// returns `Ok(None)`.
pub async fn fetch(http: &reqwest::Client, base: &Url) -> Result<Option<Credential>> {
    let url = base.join(TOKEN_PATH)?;

    let response = match http
        .get(url)
        .header("Metadata-Flavor", "Google")
        .timeout(PROBE_TIMEOUT)
        .send()
        .await
    {
        Ok(response) => response,
        Err(err) => {
            tracing::debug!(error = %err, "metadata server unreachable");
            return Ok(None);
        }
    };

    if !response.status().is_success() {
        tracing::debug!(status = %response.status(), "metadata server declined token request");
        return Ok(None);
    }

    match response.json::<MetadataTokenResponse>().await {
        Ok(body) => Ok(Some(Credential::new(
            body.access_token,
            None,
            body.expires_in,
        ))),
        Err(err) => {
            tracing::debug!(error = %err, "undecodable metadata response");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn on_platform_token_is_returned() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(
                "/computeMetadata/v1/instance/service-accounts/default/token",
            ))
            .and(header("Metadata-Flavor", "Google"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "platform-bearer",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .mount(&server)
            .await;

        let http = reqwest::Client::new();
        let base = Url::parse(&server.uri()).unwrap();
        let credential = fetch(&http, &base).await.unwrap().unwrap();

        assert_eq!(credential.access_token, "platform-bearer");
        assert!(credential.refresh_token.is_none());
    }

    #[tokio::test]
    async fn declined_request_yields_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let http = reqwest::Client::new();
        let base = Url::parse(&server.uri()).unwrap();
        assert!(fetch(&http, &base).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unreachable_server_yields_none() {
        let http = reqwest::Client::new();
        // Nothing listens on this port.
        let base = Url::parse("http://127.0.0.1:1").unwrap();
        assert!(fetch(&http, &base).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn undecodable_body_yields_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let http = reqwest::Client::new();
        let base = Url::parse(&server.uri()).unwrap();
        assert!(fetch(&http, &base).await.unwrap().is_none());
    }
}
