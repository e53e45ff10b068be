//! Bearer-token acquisition from the identity authority

use crate::errors::{MonitorError, Result};
use serde::Deserialize;
use tracing::{debug, info};

/// Audience the token is scoped to
pub const MANAGEMENT_AUDIENCE: &str = "https://management.core.windows.net/";

/// One-shot OAuth2 client-credentials exchange against a tenant authority
#[derive(Debug, Clone)]
pub struct TokenProvider {
    authority_url: String,
    tenant_id: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl TokenProvider {
    pub fn new(authority_url: String, tenant_id: String) -> Self {
        Self {
            authority_url,
            tenant_id,
        }
    }

    /// Exchange client credentials for a management access token.
    ///
    /// No retry: a rejected exchange or unreachable authority propagates
    /// to the caller immediately.
    pub async fn fetch_token(
        &self,
        client: &reqwest::Client,
        client_id: &str,
        client_secret: &str,
    ) -> Result<String> {
        let url = format!(
            "{}/{}/oauth2/token",
            self.authority_url.trim_end_matches('/'),
            self.tenant_id
        );

        debug!("Requesting access token from {}", url);

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("resource", MANAGEMENT_AUDIENCE),
        ];

        let response = client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| MonitorError::Auth(format!("identity authority unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(MonitorError::Auth(format!(
                "token request rejected with status {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| MonitorError::Auth(format!("malformed token response: {}", e)))?;

        info!(
            "Acquired management access token for tenant {}",
            self.tenant_id
        );

        Ok(token.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_token_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/tenant1/oauth2/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=spn1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "access_token": "tok123" })),
            )
            .mount(&server)
            .await;

        let provider = TokenProvider::new(server.uri(), "tenant1".to_string());
        let client = reqwest::Client::new();
        let token = provider.fetch_token(&client, "spn1", "secret").await.unwrap();
        assert_eq!(token, "tok123");
    }

    #[tokio::test]
    async fn test_fetch_token_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/tenant1/oauth2/token"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({ "error": "invalid_client" })),
            )
            .mount(&server)
            .await;

        let provider = TokenProvider::new(server.uri(), "tenant1".to_string());
        let client = reqwest::Client::new();
        let err = provider
            .fetch_token(&client, "spn1", "wrong")
            .await
            .unwrap_err();

        assert!(matches!(err, MonitorError::Auth(_)));
        // Exactly one exchange attempt, no retry.
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_token_malformed_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/tenant1/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let provider = TokenProvider::new(server.uri(), "tenant1".to_string());
        let client = reqwest::Client::new();
        let err = provider
            .fetch_token(&client, "spn1", "secret")
            .await
            .unwrap_err();

        assert!(matches!(err, MonitorError::Auth(_)));
    }
}
