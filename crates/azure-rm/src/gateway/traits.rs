//! Resource manager trait and error type.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NetworkInterface, PublicIpAddress, VirtualMachine, VirtualMachineExtension};

/// Errors that can occur while building requests or calling Azure.
#[derive(Error, Debug)]
pub enum AzureError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Long-running operation did not finish in time.
    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    /// Long-running operation finished in a non-success state.
    #[error("Operation {status}: {message}")]
    OperationFailed { status: String, message: String },

    /// Authentication error.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Azure answered successfully but left out something required.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Image locator is neither a managed image ID nor a
    /// `publisher:offer:sku:version` coordinate.
    #[error("Invalid image reference '{0}': expected '/<resource id>' or 'publisher:offer:sku:version'")]
    InvalidImageReference(String),

    /// Public IP mode outside `Static`, `Dynamic` and `None`.
    #[error("Public IP value must be either 'Dynamic', 'Static' or 'None', got '{0}'")]
    InvalidPublicIpMode(String),

    /// A multi-step provisioning sequence failed part way through.
    #[error("Provisioning failed after creating {created:?}: {source}")]
    PartialProvision {
        /// IDs (or names) of resources created before the failure.
        created: Vec<String>,
        /// The failure that stopped the sequence.
        source: Box<AzureError>,
    },
}

impl AzureError {
    /// Whether the error was raised locally, before any remote call.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::InvalidImageReference(_) | Self::InvalidPublicIpMode(_)
        )
    }
}

/// Remote operations the provisioning sequence needs.
///
/// [`AzureGateway`](super::AzureGateway) implements this over the ARM REST
/// API. Every method performs exactly one remote call, except
/// [`stop_vm`](ResourceManager::stop_vm).
#[async_trait]
pub trait ResourceManager: Send + Sync {
    // ========================================================================
    // Virtual machines
    // ========================================================================

    /// Create or update a VM and return the service's descriptor.
    async fn create_or_update_vm(
        &self,
        resource_group: &str,
        name: &str,
        vm: &VirtualMachine,
    ) -> Result<VirtualMachine, AzureError>;

    /// Get a VM's model.
    async fn get_vm(&self, resource_group: &str, name: &str) -> Result<VirtualMachine, AzureError>;

    /// Get a VM including its instance view.
    async fn get_vm_instance_view(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<VirtualMachine, AzureError>;

    /// Delete a VM.
    async fn delete_vm(&self, resource_group: &str, name: &str) -> Result<(), AzureError>;

    /// Start a VM.
    async fn start_vm(&self, resource_group: &str, name: &str) -> Result<(), AzureError>;

    /// Power off a VM. Compute stays allocated (and billed).
    async fn power_off_vm(&self, resource_group: &str, name: &str) -> Result<(), AzureError>;

    /// Deallocate a VM, releasing its compute.
    async fn deallocate_vm(&self, resource_group: &str, name: &str) -> Result<(), AzureError>;

    /// Stop a VM: power off, then deallocate.
    ///
    /// The two calls are not atomic. If deallocation fails the VM is left
    /// powered off but still allocated.
    async fn stop_vm(&self, resource_group: &str, name: &str) -> Result<(), AzureError> {
        self.power_off_vm(resource_group, name).await?;
        self.deallocate_vm(resource_group, name).await
    }

    /// Power state token of a VM (`running`, `deallocated`, ...), if reported.
    async fn check_vm_status(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<Option<String>, AzureError> {
        let vm = self.get_vm_instance_view(resource_group, name).await?;
        Ok(super::power_state(&vm))
    }

    /// Create or update a VM extension.
    async fn create_or_update_vm_extension(
        &self,
        resource_group: &str,
        vm_name: &str,
        extension_name: &str,
        extension: &VirtualMachineExtension,
    ) -> Result<VirtualMachineExtension, AzureError>;

    // ========================================================================
    // Network
    // ========================================================================

    /// Create or update a public IP address.
    async fn create_or_update_public_ip(
        &self,
        resource_group: &str,
        name: &str,
        public_ip: &PublicIpAddress,
    ) -> Result<PublicIpAddress, AzureError>;

    /// Delete a public IP address.
    async fn delete_public_ip(&self, resource_group: &str, name: &str) -> Result<(), AzureError>;

    /// Create or update a network interface.
    async fn create_or_update_nic(
        &self,
        resource_group: &str,
        name: &str,
        nic: &NetworkInterface,
    ) -> Result<NetworkInterface, AzureError>;

    /// Get a network interface.
    async fn get_nic(&self, resource_group: &str, name: &str)
        -> Result<NetworkInterface, AzureError>;

    /// Delete a network interface.
    async fn delete_nic(&self, resource_group: &str, name: &str) -> Result<(), AzureError>;

    // ========================================================================
    // Disks
    // ========================================================================

    /// Delete a managed disk.
    async fn delete_disk(&self, resource_group: &str, name: &str) -> Result<(), AzureError>;
}
