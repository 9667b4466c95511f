//! Azure gateway: one method per remote operation.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use tracing::debug;

use super::compute::ComputeClient;
use super::network::NetworkClient;
use super::resources::{ResourceClient, StorageClient};
use super::transport::ArmTransport;
use super::{AzureError, ResourceManager};
use crate::config::{ArmEndpoints, AzureCredentials};
use crate::models::{
    NetworkInterface, PublicIpAddress, StorageAccount, Subnet, VirtualMachine,
    VirtualMachineExtension, VirtualMachineSize, VirtualNetwork,
};

/// Facade over the Azure Resource Manager API for one service principal
/// and subscription.
///
/// Scoped sub-clients are created on first use and reused. They share one
/// HTTP client and one token cache, so cloning the gateway is cheap.
#[derive(Debug, Clone)]
pub struct AzureGateway {
    transport: Arc<ArmTransport>,
    compute: OnceLock<ComputeClient>,
    network: OnceLock<NetworkClient>,
    resources: OnceLock<ResourceClient>,
    storage: OnceLock<StorageClient>,
}

impl AzureGateway {
    /// Create a gateway against the public Azure cloud.
    ///
    /// # Errors
    /// Returns error if a credential field is blank or the HTTP client
    /// cannot be created.
    pub fn new(credentials: AzureCredentials) -> Result<Self, AzureError> {
        Self::with_endpoints(credentials, ArmEndpoints::default())
    }

    /// Create a gateway against custom endpoints.
    ///
    /// # Errors
    /// Returns error if a credential field is blank or the HTTP client
    /// cannot be created.
    pub fn with_endpoints(
        credentials: AzureCredentials,
        endpoints: ArmEndpoints,
    ) -> Result<Self, AzureError> {
        credentials.validate()?;
        let transport = ArmTransport::new(credentials, endpoints)?;

        Ok(Self {
            transport: Arc::new(transport),
            compute: OnceLock::new(),
            network: OnceLock::new(),
            resources: OnceLock::new(),
            storage: OnceLock::new(),
        })
    }

    /// Compute sub-client.
    pub fn compute(&self) -> &ComputeClient {
        self.compute
            .get_or_init(|| ComputeClient::new(Arc::clone(&self.transport)))
    }

    /// Network sub-client.
    pub fn network(&self) -> &NetworkClient {
        self.network
            .get_or_init(|| NetworkClient::new(Arc::clone(&self.transport)))
    }

    /// Resources sub-client.
    pub fn resources(&self) -> &ResourceClient {
        self.resources
            .get_or_init(|| ResourceClient::new(Arc::clone(&self.transport)))
    }

    /// Storage sub-client.
    pub fn storage(&self) -> &StorageClient {
        self.storage
            .get_or_init(|| StorageClient::new(Arc::clone(&self.transport)))
    }

    /// Names of all resource groups in the subscription.
    ///
    /// # Errors
    /// Propagates any transport or API error.
    pub async fn list_resource_groups(&self) -> Result<Vec<String>, AzureError> {
        let groups = self.resources().list_resource_groups().await?;
        Ok(groups.into_iter().map(|rg| rg.name).collect())
    }

    /// All virtual networks in the subscription.
    ///
    /// # Errors
    /// Propagates any transport or API error.
    pub async fn list_virtual_networks(&self) -> Result<Vec<VirtualNetwork>, AzureError> {
        self.network().list_all_virtual_networks().await
    }

    /// Subnets of a virtual network.
    ///
    /// # Errors
    /// Propagates any transport or API error.
    pub async fn list_subnets(
        &self,
        resource_group: &str,
        vnet_name: &str,
    ) -> Result<Vec<Subnet>, AzureError> {
        self.network().list_subnets(resource_group, vnet_name).await
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
        self.network().get_public_ip(resource_group, name).await
    }

    /// Get a VM extension.
    ///
    /// # Errors
    /// Propagates any transport or API error.
    pub async fn get_vm_extension(
        &self,
        resource_group: &str,
        vm_name: &str,
        extension_name: &str,
    ) -> Result<VirtualMachineExtension, AzureError> {
        self.compute()
            .get_extension(resource_group, vm_name, extension_name)
            .await
    }

    /// VM sizes offered in a region.
    ///
    /// The region is normalized (whitespace removed, lowercased) so display
    /// names such as `"East US 2"` work. An absent or blank region returns an
    /// empty list without calling Azure.
    ///
    /// # Errors
    /// Propagates any transport or API error.
    pub async fn list_vm_sizes(
        &self,
        region: Option<&str>,
    ) -> Result<Vec<VirtualMachineSize>, AzureError> {
        let Some(location) = region.map(normalize_region).filter(|r| !r.is_empty()) else {
            debug!("No region given, skipping VM size lookup");
            return Ok(Vec::new());
        };

        self.compute().list_vm_sizes(&location).await
    }

    /// VMs in a region.
    ///
    /// # Errors
    /// Propagates any transport or API error.
    pub async fn list_vms(&self, region: &str) -> Result<Vec<VirtualMachine>, AzureError> {
        self.compute().list_vms_by_location(region).await
    }

    /// All storage accounts in the subscription.
    ///
    /// # Errors
    /// Propagates any transport or API error.
    pub async fn list_storage_accounts(&self) -> Result<Vec<StorageAccount>, AzureError> {
        self.storage().list_storage_accounts().await
    }
}

/// Strip all whitespace and lowercase, e.g. `"West Europe"` -> `"westeurope"`.
pub(crate) fn normalize_region(region: &str) -> String {
    region
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

#[async_trait]
impl ResourceManager for AzureGateway {
    async fn create_or_update_vm(
        &self,
        resource_group: &str,
        name: &str,
        vm: &VirtualMachine,
    ) -> Result<VirtualMachine, AzureError> {
        self.compute()
            .create_or_update_vm(resource_group, name, vm)
            .await
    }

    async fn get_vm(&self, resource_group: &str, name: &str) -> Result<VirtualMachine, AzureError> {
        self.compute().get_vm(resource_group, name).await
    }

    async fn get_vm_instance_view(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<VirtualMachine, AzureError> {
        self.compute().get_vm_instance_view(resource_group, name).await
    }

    async fn delete_vm(&self, resource_group: &str, name: &str) -> Result<(), AzureError> {
        self.compute().delete_vm(resource_group, name).await
    }

    async fn start_vm(&self, resource_group: &str, name: &str) -> Result<(), AzureError> {
        self.compute().start_vm(resource_group, name).await
    }

    async fn power_off_vm(&self, resource_group: &str, name: &str) -> Result<(), AzureError> {
        self.compute().power_off_vm(resource_group, name).await
    }

    async fn deallocate_vm(&self, resource_group: &str, name: &str) -> Result<(), AzureError> {
        self.compute().deallocate_vm(resource_group, name).await
    }

    async fn create_or_update_vm_extension(
        &self,
        resource_group: &str,
        vm_name: &str,
        extension_name: &str,
        extension: &VirtualMachineExtension,
    ) -> Result<VirtualMachineExtension, AzureError> {
        self.compute()
            .create_or_update_extension(resource_group, vm_name, extension_name, extension)
            .await
    }

    async fn create_or_update_public_ip(
        &self,
        resource_group: &str,
        name: &str,
        public_ip: &PublicIpAddress,
    ) -> Result<PublicIpAddress, AzureError> {
        self.network()
            .create_or_update_public_ip(resource_group, name, public_ip)
            .await
    }

    async fn delete_public_ip(&self, resource_group: &str, name: &str) -> Result<(), AzureError> {
        self.network().delete_public_ip(resource_group, name).await
    }

    async fn create_or_update_nic(
        &self,
        resource_group: &str,
        name: &str,
        nic: &NetworkInterface,
    ) -> Result<NetworkInterface, AzureError> {
        self.network()
            .create_or_update_nic(resource_group, name, nic)
            .await
    }

    async fn get_nic(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<NetworkInterface, AzureError> {
        self.network().get_nic(resource_group, name).await
    }

    async fn delete_nic(&self, resource_group: &str, name: &str) -> Result<(), AzureError> {
        self.network().delete_nic(resource_group, name).await
    }

    async fn delete_disk(&self, resource_group: &str, name: &str) -> Result<(), AzureError> {
        self.compute().delete_disk(resource_group, name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_region() {
        assert_eq!(normalize_region("East US 2"), "eastus2");
        assert_eq!(normalize_region("  westeurope\t"), "westeurope");
        assert_eq!(normalize_region("   "), "");
    }

    #[test]
    fn test_gateway_rejects_blank_credentials() {
        let err = AzureGateway::new(AzureCredentials::new("", "app", "secret", "sub")).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_sub_clients_are_memoized() {
        let gateway =
            AzureGateway::new(AzureCredentials::new("tenant", "app", "secret", "sub")).unwrap();
        assert!(std::ptr::eq(gateway.compute(), gateway.compute()));
        assert!(std::ptr::eq(gateway.network(), gateway.network()));
    }
}
