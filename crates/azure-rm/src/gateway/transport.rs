//! Authenticated HTTP transport shared by all scoped sub-clients.

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, LOCATION, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::auth::TokenProvider;
use super::AzureError;
use crate::config::{ArmEndpoints, AzureCredentials};

/// Header naming the status monitor of a long-running operation.
const ASYNC_OPERATION_HEADER: &str = "Azure-AsyncOperation";

/// Body of an `Azure-AsyncOperation` status monitor.
#[derive(Debug, Deserialize)]
struct OperationStatus {
    status: String,
    #[serde(default)]
    error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Where to poll a long-running operation.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Monitor {
    /// Returns an [`OperationStatus`] document.
    AsyncOperation(String),
    /// Answers 202 while running, then any other success status.
    Location(String),
}

impl Monitor {
    /// Monitor announced by a 201/202 response, if any.
    fn from_response(status: StatusCode, headers: &HeaderMap) -> Option<Self> {
        if !matches!(status, StatusCode::CREATED | StatusCode::ACCEPTED) {
            return None;
        }

        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        header(ASYNC_OPERATION_HEADER)
            .map(Self::AsyncOperation)
            .or_else(|| header(LOCATION.as_str()).map(Self::Location))
    }

    fn url(&self) -> &str {
        match self {
            Self::AsyncOperation(url) | Self::Location(url) => url,
        }
    }
}

/// `Retry-After` in whole seconds.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// HTTP client, token cache and URL layout for one subscription.
#[derive(Debug)]
pub(crate) struct ArmTransport {
    client: Client,
    tokens: TokenProvider,
    endpoints: ArmEndpoints,
    subscription_id: String,
}

impl ArmTransport {
    pub(crate) fn new(
        credentials: AzureCredentials,
        endpoints: ArmEndpoints,
    ) -> Result<Self, AzureError> {
        let client = Client::builder()
            .timeout(endpoints.timeout)
            .build()
            .map_err(AzureError::Http)?;

        Ok(Self {
            client,
            subscription_id: credentials.subscription_id.clone(),
            tokens: TokenProvider::new(credentials, &endpoints),
            endpoints,
        })
    }

    /// URL of a subscription-scoped path.
    pub(crate) fn subscription_url(&self, path: &str, api_version: &str) -> String {
        format!(
            "{}/subscriptions/{}{}?api-version={}",
            self.endpoints.management_base(),
            self.subscription_id,
            path,
            api_version
        )
    }

    /// URL of a resource inside a resource group.
    ///
    /// `provider_path` starts after `/providers/`, e.g.
    /// `Microsoft.Compute/virtualMachines/vm1`.
    pub(crate) fn resource_url(
        &self,
        resource_group: &str,
        provider_path: &str,
        api_version: &str,
    ) -> String {
        self.subscription_url(
            &format!("/resourceGroups/{resource_group}/providers/{provider_path}"),
            api_version,
        )
    }

    async fn bearer(&self) -> Result<String, AzureError> {
        let token = self.tokens.token(&self.client).await?;
        Ok(format!("Bearer {token}"))
    }

    /// Make an authenticated GET request.
    pub(crate) async fn get<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, AzureError> {
        debug!(url = %url, "GET request");

        let response = self
            .client
            .get(url)
            .header("Authorization", self.bearer().await?)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Make an authenticated PUT request.
    ///
    /// When Azure accepts the request as a long-running operation, waits for
    /// it to finish and returns the resource as it stands afterwards.
    pub(crate) async fn put<T, B>(&self, url: &str, body: &B) -> Result<T, AzureError>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        debug!(url = %url, "PUT request");

        let response = self
            .client
            .put(url)
            .header("Authorization", self.bearer().await?)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        if let Some(monitor) = Monitor::from_response(response.status(), response.headers()) {
            let delay = retry_after(response.headers());
            self.wait_for_operation(&monitor, delay).await?;
            return self.get(url).await;
        }

        Self::handle_response(response).await
    }

    /// Make an authenticated POST request that returns empty body.
    ///
    /// Waits for the operation to finish if Azure runs it asynchronously.
    pub(crate) async fn post_empty(&self, url: &str) -> Result<(), AzureError> {
        debug!(url = %url, "POST request (empty)");

        let response = self
            .client
            .post(url)
            .header("Authorization", self.bearer().await?)
            .header("Content-Length", "0")
            .send()
            .await?;

        self.finish(response).await
    }

    /// Make an authenticated DELETE request.
    ///
    /// Waits for the deletion to finish if Azure runs it asynchronously.
    pub(crate) async fn delete(&self, url: &str) -> Result<(), AzureError> {
        debug!(url = %url, "DELETE request");

        let response = self
            .client
            .delete(url)
            .header("Authorization", self.bearer().await?)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(url = %url, "Resource already gone");
            return Ok(());
        }

        self.finish(response).await
    }

    /// Complete a bodiless request, following its operation monitor if any.
    async fn finish(&self, response: reqwest::Response) -> Result<(), AzureError> {
        match Monitor::from_response(response.status(), response.headers()) {
            Some(monitor) => {
                let delay = retry_after(response.headers());
                self.wait_for_operation(&monitor, delay).await
            }
            None => Self::handle_empty(response).await,
        }
    }

    /// Poll an operation monitor until the operation reaches a final state.
    async fn wait_for_operation(
        &self,
        monitor: &Monitor,
        first_delay: Option<Duration>,
    ) -> Result<(), AzureError> {
        let start = Instant::now();
        let timeout = self.endpoints.operation_timeout;
        let mut delay = first_delay.unwrap_or(self.endpoints.poll_interval);

        loop {
            tokio::time::sleep(delay).await;

            let response = self
                .client
                .get(monitor.url())
                .header("Authorization", self.bearer().await?)
                .send()
                .await?;
            let status = response.status();
            delay = retry_after(response.headers()).unwrap_or(self.endpoints.poll_interval);

            debug!(
                url = %monitor.url(),
                status = %status,
                elapsed_secs = start.elapsed().as_secs(),
                "Polling operation"
            );

            let done = match monitor {
                Monitor::AsyncOperation(_) => {
                    let operation: OperationStatus = Self::handle_response(response).await?;
                    match operation.status.as_str() {
                        "Succeeded" => true,
                        "Failed" | "Canceled" => {
                            let message = operation
                                .error
                                .map(|e| format!("{}: {}", e.code, e.message))
                                .unwrap_or_default();
                            warn!(status = %operation.status, error = %message, "Operation did not succeed");
                            return Err(AzureError::OperationFailed {
                                status: operation.status,
                                message,
                            });
                        }
                        _ => false,
                    }
                }
                Monitor::Location(_) if status == StatusCode::ACCEPTED => false,
                Monitor::Location(_) => {
                    Self::handle_empty(response).await?;
                    true
                }
            };

            if done {
                info!(elapsed_secs = start.elapsed().as_secs(), "Operation completed");
                return Ok(());
            }

            if start.elapsed() > timeout {
                return Err(AzureError::Timeout(timeout.as_secs()));
            }
        }
    }

    async fn handle_empty(response: reqwest::Response) -> Result<(), AzureError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(Self::error_for(status, text))
        }
    }

    /// Handle API response.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, AzureError> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str(&text).map_err(|e| {
                warn!(error = %e, body = %text, "Failed to parse response");
                AzureError::Serialization(e)
            })
        } else {
            Err(Self::error_for(status, text))
        }
    }

    fn error_for(status: StatusCode, text: String) -> AzureError {
        match status {
            StatusCode::NOT_FOUND => AzureError::NotFound(text),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AzureError::Auth(text),
            _ => AzureError::Api {
                status: status.as_u16(),
                message: text,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> ArmTransport {
        ArmTransport::new(
            AzureCredentials::new("tenant", "app", "secret", "sub-123"),
            ArmEndpoints::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_resource_url_layout() {
        let url = transport().resource_url(
            "rg1",
            "Microsoft.Compute/virtualMachines/vm1",
            "2023-09-01",
        );
        assert_eq!(
            url,
            "https://management.azure.com/subscriptions/sub-123/resourceGroups/rg1/providers/Microsoft.Compute/virtualMachines/vm1?api-version=2023-09-01"
        );
    }

    #[test]
    fn test_monitor_prefers_async_operation_header() {
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, "https://arm/operationResults/1".parse().unwrap());
        assert_eq!(
            Monitor::from_response(StatusCode::ACCEPTED, &headers),
            Some(Monitor::Location("https://arm/operationResults/1".to_string()))
        );

        headers.insert(ASYNC_OPERATION_HEADER, "https://arm/operations/1".parse().unwrap());
        assert_eq!(
            Monitor::from_response(StatusCode::CREATED, &headers),
            Some(Monitor::AsyncOperation("https://arm/operations/1".to_string()))
        );
        // synchronous completions carry no monitor
        assert_eq!(Monitor::from_response(StatusCode::OK, &headers), None);
    }

    #[test]
    fn test_retry_after_seconds() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), None);
        headers.insert(RETRY_AFTER, "7".parse().unwrap());
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(7)));
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            ArmTransport::error_for(StatusCode::NOT_FOUND, String::new()),
            AzureError::NotFound(_)
        ));
        assert!(matches!(
            ArmTransport::error_for(StatusCode::FORBIDDEN, String::new()),
            AzureError::Auth(_)
        ));
        assert!(matches!(
            ArmTransport::error_for(StatusCode::CONFLICT, "busy".to_string()),
            AzureError::Api { status: 409, .. }
        ));
    }
}
