//! Resource-group and storage sub-clients.

use std::sync::Arc;

use super::transport::ArmTransport;
use super::AzureError;
use crate::models::{ListResponse, ResourceGroup, StorageAccount};

/// Azure API version for Resources.
const RESOURCES_API_VERSION: &str = "2022-09-01";

/// Azure API version for Storage.
const STORAGE_API_VERSION: &str = "2023-01-01";

/// Client for `Microsoft.Resources`.
#[derive(Debug, Clone)]
pub struct ResourceClient {
    transport: Arc<ArmTransport>,
}

impl ResourceClient {
    pub(crate) fn new(transport: Arc<ArmTransport>) -> Self {
        Self { transport }
    }

    /// All resource groups in the subscription.
    ///
    /// # Errors
    /// Propagates any transport or API error.
    pub async fn list_resource_groups(&self) -> Result<Vec<ResourceGroup>, AzureError> {
        let url = self
            .transport
            .subscription_url("/resourcegroups", RESOURCES_API_VERSION);
        let response: ListResponse<ResourceGroup> = self.transport.get(&url).await?;
        Ok(response.value)
    }
}

/// Client for `Microsoft.Storage`.
#[derive(Debug, Clone)]
pub struct StorageClient {
    transport: Arc<ArmTransport>,
}

impl StorageClient {
    pub(crate) fn new(transport: Arc<ArmTransport>) -> Self {
        Self { transport }
    }

    /// All storage accounts in the subscription.
    ///
    /// # Errors
    /// Propagates any transport or API error.
    pub async fn list_storage_accounts(&self) -> Result<Vec<StorageAccount>, AzureError> {
        let url = self.transport.subscription_url(
            "/providers/Microsoft.Storage/storageAccounts",
            STORAGE_API_VERSION,
        );
        let response: ListResponse<StorageAccount> = self.transport.get(&url).await?;
        Ok(response.value)
    }
}
