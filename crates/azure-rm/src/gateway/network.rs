//! Network sub-client: public IPs, NICs, virtual networks.

use std::sync::Arc;

use tracing::info;

use super::transport::ArmTransport;
use super::AzureError;
use crate::models::{ListResponse, NetworkInterface, PublicIpAddress, Subnet, VirtualNetwork};

/// Azure API version for Network.
const NETWORK_API_VERSION: &str = "2023-09-01";

/// Client for `Microsoft.Network`.
#[derive(Debug, Clone)]
pub struct NetworkClient {
    transport: Arc<ArmTransport>,
}

impl NetworkClient {
    pub(crate) fn new(transport: Arc<ArmTransport>) -> Self {
        Self { transport }
    }

    fn url(&self, resource_group: &str, kind: &str, name: &str) -> String {
        self.transport.resource_url(
            resource_group,
            &format!("Microsoft.Network/{kind}/{name}"),
            NETWORK_API_VERSION,
        )
    }

    /// Create or update a public IP address.
    ///
    /// # Errors
    /// Propagates any transport or API error.
    pub async fn create_or_update_public_ip(
        &self,
        resource_group: &str,
        name: &str,
        public_ip: &PublicIpAddress,
    ) -> Result<PublicIpAddress, AzureError> {
        info!(resource_group = %resource_group, public_ip = %name, "Submitting public IP");
        self.transport
            .put(&self.url(resource_group, "publicIPAddresses", name), public_ip)
            .await
    }

    /// Get a public IP address.
    ///
    /// # Errors
    /// Propagates any transport or API error.
    pub async fn get_public_ip(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<PublicIpAddress, AzureError> {
        self.transport
            .get(&self.url(resource_group, "publicIPAddresses", name))
            .await
    }

    /// Delete a public IP address.
    ///
    /// # Errors
    /// Propagates any transport or API error.
    pub async fn delete_public_ip(&self, resource_group: &str, name: &str) -> Result<(), AzureError> {
        info!(resource_group = %resource_group, public_ip = %name, "Deleting public IP");
        self.transport
            .delete(&self.url(resource_group, "publicIPAddresses", name))
            .await
    }

    /// Create or update a network interface.
    ///
    /// # Errors
    /// Propagates any transport or API error.
    pub async fn create_or_update_nic(
        &self,
        resource_group: &str,
        name: &str,
        nic: &NetworkInterface,
    ) -> Result<NetworkInterface, AzureError> {
        info!(resource_group = %resource_group, nic = %name, "Submitting network interface");
        self.transport
            .put(&self.url(resource_group, "networkInterfaces", name), nic)
            .await
    }

    /// Get a network interface.
    ///
    /// # Errors
    /// Propagates any transport or API error.
    pub async fn get_nic(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<NetworkInterface, AzureError> {
        self.transport
            .get(&self.url(resource_group, "networkInterfaces", name))
            .await
    }

    /// Delete a network interface.
    ///
    /// # Errors
    /// Propagates any transport or API error.
    pub async fn delete_nic(&self, resource_group: &str, name: &str) -> Result<(), AzureError> {
        info!(resource_group = %resource_group, nic = %name, "Deleting network interface");
        self.transport
            .delete(&self.url(resource_group, "networkInterfaces", name))
            .await
    }

    /// All virtual networks in the subscription.
    ///
    /// # Errors
    /// Propagates any transport or API error.
    pub async fn list_all_virtual_networks(&self) -> Result<Vec<VirtualNetwork>, AzureError> {
        let url = self.transport.subscription_url(
            "/providers/Microsoft.Network/virtualNetworks",
            NETWORK_API_VERSION,
        );
        let response: ListResponse<VirtualNetwork> = self.transport.get(&url).await?;
        Ok(response.value)
    }

    /// Subnets of one virtual network.
    ///
    /// # Errors
    /// Propagates any transport or API error.
    pub async fn list_subnets(
        &self,
        resource_group: &str,
        vnet_name: &str,
    ) -> Result<Vec<Subnet>, AzureError> {
        let url = self.transport.resource_url(
            resource_group,
            &format!("Microsoft.Network/virtualNetworks/{vnet_name}/subnets"),
            NETWORK_API_VERSION,
        );
        let response: ListResponse<Subnet> = self.transport.get(&url).await?;
        Ok(response.value)
    }
}
