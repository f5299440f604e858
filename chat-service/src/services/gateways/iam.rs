//! IBM Cloud IAM API-key to bearer-token exchange.

use super::{ensure_success, GatewayError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use service_core::observability::TracedClientExt;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const APIKEY_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// Tokens are refreshed this long before they expire.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'a str,
    apikey: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// Exchanges an API key for IAM access tokens and reuses them until close to expiry.
pub struct IamAuthenticator {
    api_key: String,
    token_url: String,
    client: Client,
    token: Mutex<Option<CachedToken>>,
}

impl IamAuthenticator {
    pub fn new(api_key: impl Into<String>, iam_url: &str, client: Client) -> Self {
        Self {
            api_key: api_key.into(),
            token_url: format!("{}/identity/token", iam_url.trim_end_matches('/')),
            client,
            token: Mutex::new(None),
        }
    }

    /// Current bearer token, fetching a fresh one when needed.
    pub async fn access_token(&self) -> Result<String, GatewayError> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }

        let token = self.request_token().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn request_token(&self) -> Result<CachedToken, GatewayError> {
        tracing::debug!(url = %self.token_url, "Requesting IAM access token");

        let response = self
            .client
            .traced_post(&self.token_url)
            .header("Accept", "application/json")
            .form(&TokenRequest {
                grant_type: APIKEY_GRANT_TYPE,
                apikey: &self.api_key,
            })
            .send()
            .await
            .map_err(|e| GatewayError::Authentication(e.to_string()))?;

        let response = ensure_success(response).await.map_err(|e| match e {
            GatewayError::ApiError { status, .. } => {
                GatewayError::Authentication(format!("IAM token request failed: {}", status))
            }
            other => other,
        })?;

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Authentication(format!("Invalid IAM response: {}", e)))?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(REFRESH_MARGIN);

        Ok(CachedToken {
            value: token.access_token,
            refresh_at: Instant::now() + lifetime,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_url_is_built_from_base() {
        let auth = IamAuthenticator::new("key", "https://iam.cloud.ibm.com/", Client::new());
        assert_eq!(auth.token_url, "https://iam.cloud.ibm.com/identity/token");
    }

    #[tokio::test]
    async fn cached_token_is_reused() {
        let auth = IamAuthenticator::new("key", "http://127.0.0.1:1", Client::new());
        *auth.token.lock().await = Some(CachedToken {
            value: "cached".to_string(),
            refresh_at: Instant::now() + Duration::from_secs(300),
        });

        assert_eq!(auth.access_token().await.unwrap(), "cached");
    }

    #[tokio::test]
    async fn unreachable_iam_is_authentication_error() {
        let auth = IamAuthenticator::new("key", "http://127.0.0.1:1", Client::new());
        let err = auth.access_token().await.unwrap_err();
        assert!(matches!(err, GatewayError::Authentication(_)));
    }

    #[test]
    fn missing_expiry_defaults_to_an_hour() {
        let token: TokenResponse = serde_json::from_str(r#"{"access_token":"t"}"#).unwrap();
        assert_eq!(token.expires_in, 3600);
    }
}
