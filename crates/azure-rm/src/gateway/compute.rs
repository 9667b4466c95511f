//! Compute sub-client: VMs, extensions, sizes and disks.

use std::sync::Arc;

use tracing::info;

use super::transport::ArmTransport;
use super::AzureError;
use crate::models::{ListResponse, VirtualMachine, VirtualMachineExtension, VirtualMachineSize};

/// Azure API version for Compute.
const COMPUTE_API_VERSION: &str = "2023-09-01";

/// Azure API version for managed disks.
const DISK_API_VERSION: &str = "2023-04-02";

/// Client for `Microsoft.Compute`.
#[derive(Debug, Clone)]
pub struct ComputeClient {
    transport: Arc<ArmTransport>,
}

impl ComputeClient {
    pub(crate) fn new(transport: Arc<ArmTransport>) -> Self {
        Self { transport }
    }

    fn vm_url(&self, resource_group: &str, name: &str) -> String {
        self.transport.resource_url(
            resource_group,
            &format!("Microsoft.Compute/virtualMachines/{name}"),
            COMPUTE_API_VERSION,
        )
    }

    fn vm_action_url(&self, resource_group: &str, name: &str, action: &str) -> String {
        self.transport.resource_url(
            resource_group,
            &format!("Microsoft.Compute/virtualMachines/{name}/{action}"),
            COMPUTE_API_VERSION,
        )
    }

    /// Create or update a VM.
    ///
    /// # Errors
    /// Propagates any transport or API error.
    pub async fn create_or_update_vm(
        &self,
        resource_group: &str,
        name: &str,
        vm: &VirtualMachine,
    ) -> Result<VirtualMachine, AzureError> {
        info!(resource_group = %resource_group, vm_name = %name, "Submitting VM");
        self.transport
            .put(&self.vm_url(resource_group, name), vm)
            .await
    }

    /// Get a VM's model.
    ///
    /// # Errors
    /// Propagates any transport or API error.
    pub async fn get_vm(&self, resource_group: &str, name: &str) -> Result<VirtualMachine, AzureError> {
        self.transport.get(&self.vm_url(resource_group, name)).await
    }

    /// Get a VM with its instance view expanded.
    ///
    /// # Errors
    /// Propagates any transport or API error.
    pub async fn get_vm_instance_view(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<VirtualMachine, AzureError> {
        let url = format!("{}&$expand=instanceView", self.vm_url(resource_group, name));
        self.transport.get(&url).await
    }

    /// Delete a VM.
    ///
    /// # Errors
    /// Propagates any transport or API error.
    pub async fn delete_vm(&self, resource_group: &str, name: &str) -> Result<(), AzureError> {
        info!(resource_group = %resource_group, vm_name = %name, "Deleting VM");
        self.transport.delete(&self.vm_url(resource_group, name)).await
    }

    /// List VMs in a location across the subscription.
    ///
    /// # Errors
    /// Propagates any transport or API error.
    pub async fn list_vms_by_location(
        &self,
        location: &str,
    ) -> Result<Vec<VirtualMachine>, AzureError> {
        let url = self.transport.subscription_url(
            &format!("/providers/Microsoft.Compute/locations/{location}/virtualMachines"),
            COMPUTE_API_VERSION,
        );
        let response: ListResponse<VirtualMachine> = self.transport.get(&url).await?;
        Ok(response.value)
    }

    /// Start a VM.
    ///
    /// # Errors
    /// Propagates any transport or API error.
    pub async fn start_vm(&self, resource_group: &str, name: &str) -> Result<(), AzureError> {
        info!(resource_group = %resource_group, vm_name = %name, "Starting VM");
        self.transport
            .post_empty(&self.vm_action_url(resource_group, name, "start"))
            .await
    }

    /// Power off a VM.
    ///
    /// # Errors
    /// Propagates any transport or API error.
    pub async fn power_off_vm(&self, resource_group: &str, name: &str) -> Result<(), AzureError> {
        info!(resource_group = %resource_group, vm_name = %name, "Powering off VM");
        self.transport
            .post_empty(&self.vm_action_url(resource_group, name, "powerOff"))
            .await
    }

    /// Deallocate a VM.
    ///
    /// # Errors
    /// Propagates any transport or API error.
    pub async fn deallocate_vm(&self, resource_group: &str, name: &str) -> Result<(), AzureError> {
        info!(resource_group = %resource_group, vm_name = %name, "Deallocating VM");
        self.transport
            .post_empty(&self.vm_action_url(resource_group, name, "deallocate"))
            .await
    }

    fn extension_url(&self, resource_group: &str, vm_name: &str, extension_name: &str) -> String {
        self.transport.resource_url(
            resource_group,
            &format!("Microsoft.Compute/virtualMachines/{vm_name}/extensions/{extension_name}"),
            COMPUTE_API_VERSION,
        )
    }

    /// Create or update a VM extension.
    ///
    /// # Errors
    /// Propagates any transport or API error.
    pub async fn create_or_update_extension(
        &self,
        resource_group: &str,
        vm_name: &str,
        extension_name: &str,
        extension: &VirtualMachineExtension,
    ) -> Result<VirtualMachineExtension, AzureError> {
        info!(
            resource_group = %resource_group,
            vm_name = %vm_name,
            extension = %extension_name,
            "Submitting VM extension"
        );
        self.transport
            .put(
                &self.extension_url(resource_group, vm_name, extension_name),
                extension,
            )
            .await
    }

    /// Get a VM extension.
    ///
    /// # Errors
    /// Propagates any transport or API error.
    pub async fn get_extension(
        &self,
        resource_group: &str,
        vm_name: &str,
        extension_name: &str,
    ) -> Result<VirtualMachineExtension, AzureError> {
        self.transport
            .get(&self.extension_url(resource_group, vm_name, extension_name))
            .await
    }

    /// VM sizes available in a location. `location` must already be
    /// normalized.
    ///
    /// # Errors
    /// Propagates any transport or API error.
    pub async fn list_vm_sizes(&self, location: &str) -> Result<Vec<VirtualMachineSize>, AzureError> {
        let url = self.transport.subscription_url(
            &format!("/providers/Microsoft.Compute/locations/{location}/vmSizes"),
            COMPUTE_API_VERSION,
        );
        let response: ListResponse<VirtualMachineSize> = self.transport.get(&url).await?;
        Ok(response.value)
    }

    /// Delete a managed disk.
    ///
    /// # Errors
    /// Propagates any transport or API error.
    pub async fn delete_disk(&self, resource_group: &str, name: &str) -> Result<(), AzureError> {
        info!(resource_group = %resource_group, disk = %name, "Deleting disk");
        let url = self.transport.resource_url(
            resource_group,
            &format!("Microsoft.Compute/disks/{name}"),
            DISK_API_VERSION,
        );
        self.transport.delete(&url).await
    }
}
