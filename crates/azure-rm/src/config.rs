//! Service principal credentials and endpoint configuration.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::gateway::AzureError;

/// Public Azure cloud management endpoint.
pub const DEFAULT_MANAGEMENT_URL: &str = "https://management.azure.com";

/// Public Azure cloud token authority.
pub const DEFAULT_AUTHORITY_URL: &str = "https://login.microsoftonline.com";

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default interval between long-running operation polls.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 15;

/// Default upper bound on waiting for a long-running operation.
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 1800;

/// Service principal credential tuple.
///
/// Held for the lifetime of an [`AzureGateway`](crate::AzureGateway).
#[derive(Clone, Serialize, Deserialize)]
pub struct AzureCredentials {
    /// Directory (tenant) ID.
    pub tenant_id: String,
    /// Application (client) ID.
    pub client_id: String,
    /// Client secret.
    pub client_secret: String,
    /// Subscription the resources live in.
    pub subscription_id: String,
}

impl AzureCredentials {
    /// Create a credential tuple.
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        subscription_id: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            subscription_id: subscription_id.into(),
        }
    }

    /// Check that no field is blank.
    ///
    /// # Errors
    /// Returns [`AzureError::Config`] naming the first empty field.
    pub fn validate(&self) -> Result<(), AzureError> {
        for (field, value) in [
            ("tenant_id", &self.tenant_id),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("subscription_id", &self.subscription_id),
        ] {
            if value.trim().is_empty() {
                return Err(AzureError::Config(format!("{field} must not be empty")));
            }
        }
        Ok(())
    }
}

// Keep the secret out of logs.
impl fmt::Debug for AzureCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureCredentials")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("subscription_id", &self.subscription_id)
            .finish()
    }
}

/// Where the gateway sends requests.
#[derive(Debug, Clone)]
pub struct ArmEndpoints {
    /// Resource Manager base URL.
    pub management: Url,
    /// Token authority base URL.
    pub authority: Url,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Wait between polls of a long-running operation, unless Azure sends
    /// `Retry-After`.
    pub poll_interval: Duration,
    /// Give up on a long-running operation after this long.
    pub operation_timeout: Duration,
}

impl ArmEndpoints {
    /// Endpoints rooted at custom base URLs (sovereign clouds, test servers).
    ///
    /// # Errors
    /// Returns [`AzureError::Config`] if either URL does not parse.
    pub fn custom(management: &str, authority: &str) -> Result<Self, AzureError> {
        let parse = |raw: &str| {
            Url::parse(raw).map_err(|e| AzureError::Config(format!("Invalid URL '{raw}': {e}")))
        };

        Ok(Self {
            management: parse(management)?,
            authority: parse(authority)?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            operation_timeout: Duration::from_secs(DEFAULT_OPERATION_TIMEOUT_SECS),
        })
    }

    /// Override the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override long-running operation polling.
    #[must_use]
    pub fn with_polling(mut self, interval: Duration, timeout: Duration) -> Self {
        self.poll_interval = interval;
        self.operation_timeout = timeout;
        self
    }

    /// Management base URL without a trailing slash.
    pub(crate) fn management_base(&self) -> &str {
        self.management.as_str().trim_end_matches('/')
    }

    /// Token endpoint for a tenant.
    pub(crate) fn token_url(&self, tenant_id: &str) -> String {
        format!(
            "{}/{tenant_id}/oauth2/v2.0/token",
            self.authority.as_str().trim_end_matches('/')
        )
    }

    /// OAuth scope covering the management endpoint.
    pub(crate) fn scope(&self) -> String {
        format!("{}/.default", self.management_base())
    }
}

impl Default for ArmEndpoints {
    fn default() -> Self {
        Self {
            management: Url::parse(DEFAULT_MANAGEMENT_URL).expect("static URL is valid"),
            authority: Url::parse(DEFAULT_AUTHORITY_URL).expect("static URL is valid"),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            operation_timeout: Duration::from_secs(DEFAULT_OPERATION_TIMEOUT_SECS),
        }
    }
}
