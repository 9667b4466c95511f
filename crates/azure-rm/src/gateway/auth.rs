//! Client-credentials token exchange for the service principal.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::AzureError;
use crate::config::{ArmEndpoints, AzureCredentials};

/// Refresh this long before the token actually expires.
const EXPIRY_SKEW_SECS: i64 = 300;

/// Upper bound on a reported token lifetime.
const MAX_TOKEN_LIFETIME_SECS: u64 = 86_400;

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

/// Token endpoint error body.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: String,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + ChronoDuration::seconds(EXPIRY_SKEW_SECS) < self.expires_at
    }
}

/// Bearer token source for one service principal.
///
/// The token is fetched on first use and reused until it is close to
/// expiry.
#[derive(Debug)]
pub(crate) struct TokenProvider {
    credentials: AzureCredentials,
    token_url: String,
    scope: String,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub(crate) fn new(credentials: AzureCredentials, endpoints: &ArmEndpoints) -> Self {
        let token_url = endpoints.token_url(&credentials.tenant_id);
        Self {
            credentials,
            token_url,
            scope: endpoints.scope(),
            cached: Mutex::new(None),
        }
    }

    /// Current bearer token, fetching a new one if needed.
    pub(crate) async fn token(&self, client: &Client) -> Result<String, AzureError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            return Ok(token.value.clone());
        }

        let token = self.fetch(client).await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn fetch(&self, client: &Client) -> Result<CachedToken, AzureError> {
        debug!(
            tenant_id = %self.credentials.tenant_id,
            client_id = %self.credentials.client_id,
            "Requesting access token"
        );

        let response = client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("scope", self.scope.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<TokenErrorResponse>(&text)
                .map(|e| format!("{}: {}", e.error, e.error_description))
                .unwrap_or(text);
            return Err(AzureError::Auth(message));
        }

        let parsed: TokenResponse = serde_json::from_str(&text)?;
        let expires_in = i64::try_from(parsed.expires_in.min(MAX_TOKEN_LIFETIME_SECS)).unwrap_or(0);

        info!(
            tenant_id = %self.credentials.tenant_id,
            expires_in_secs = expires_in,
            "Obtained access token"
        );

        Ok(CachedToken {
            value: parsed.access_token,
            expires_at: Utc::now() + ChronoDuration::seconds(expires_in),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_freshness_includes_skew() {
        let now = Utc::now();
        let almost_expired = CachedToken {
            value: "t".to_string(),
            expires_at: now + ChronoDuration::seconds(60),
        };
        let fresh = CachedToken {
            value: "t".to_string(),
            expires_at: now + ChronoDuration::seconds(3600),
        };

        assert!(!almost_expired.is_fresh(now));
        assert!(fresh.is_fresh(now));
    }

    #[test]
    fn test_token_url_uses_tenant() {
        let provider = TokenProvider::new(
            AzureCredentials::new("contoso", "app", "secret", "sub"),
            &ArmEndpoints::default(),
        );
        assert_eq!(
            provider.token_url,
            "https://login.microsoftonline.com/contoso/oauth2/v2.0/token"
        );
        assert_eq!(provider.scope, "https://management.azure.com/.default");
    }
}
