//! Azure Resource Manager request and response models.
//!
//! The same structs are used to build PUT bodies and to decode ARM
//! responses, so everything the service may omit is optional.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Shared types
// ============================================================================

/// Reference to another ARM resource by ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubResource {
    /// Resource ID.
    pub id: String,
}

impl SubResource {
    /// Reference the resource with the given ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// ARM list envelope. Only the first page is read.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    /// Items on this page.
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    /// Next link for pagination.
    pub next_link: Option<String>,
}

/// Operating system family of a VM or its OS disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OsPlatform {
    /// Linux guest.
    #[default]
    Linux,
    /// Windows guest.
    Windows,
}

impl fmt::Display for OsPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => write!(f, "Linux"),
            Self::Windows => write!(f, "Windows"),
        }
    }
}

// ============================================================================
// Virtual machine types
// ============================================================================

/// Azure virtual machine, as submitted and as returned.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachine {
    /// Resource ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// VM name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Location.
    pub location: String,
    /// Tags.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
    /// VM properties.
    #[serde(default)]
    pub properties: VirtualMachineProperties,
}

/// Azure VM properties.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineProperties {
    /// Hardware profile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardware_profile: Option<HardwareProfile>,
    /// Storage profile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_profile: Option<StorageProfile>,
    /// OS profile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_profile: Option<OsProfile>,
    /// Network profile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_profile: Option<NetworkProfile>,
    /// Availability set the VM belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_set: Option<SubResource>,
    /// Provisioning state (read-only).
    #[serde(skip_serializing)]
    pub provisioning_state: Option<String>,
    /// VM ID (read-only).
    #[serde(skip_serializing)]
    pub vm_id: Option<String>,
    /// Instance view, present when requested with `$expand=instanceView`.
    #[serde(skip_serializing)]
    pub instance_view: Option<InstanceView>,
}

/// Hardware profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareProfile {
    /// VM size.
    pub vm_size: String,
}

/// Storage profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageProfile {
    /// Image reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_reference: Option<ImageReference>,
    /// OS disk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_disk: Option<OsDisk>,
}

/// Image reference: a marketplace coordinate or a managed image ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageReference {
    /// Publisher.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    /// Offer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer: Option<String>,
    /// SKU.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    /// Version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Image ID (for managed images).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// How the OS disk is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiskCreateOption {
    /// Created from the image in the storage profile.
    FromImage,
    /// Attach an existing disk.
    Attach,
    /// Create an empty disk.
    Empty,
    /// Any option this crate does not model.
    #[serde(other)]
    Unknown,
}

/// Host caching mode of a disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CachingType {
    /// No caching.
    None,
    /// Read-only caching.
    ReadOnly,
    /// Read-write caching.
    #[default]
    ReadWrite,
}

/// Storage tier of a managed disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageAccountType {
    /// Premium SSD, locally redundant.
    #[serde(rename = "Premium_LRS")]
    PremiumLrs,
    /// Standard HDD, locally redundant.
    #[serde(rename = "Standard_LRS")]
    StandardLrs,
    /// Any tier this crate never requests (`StandardSSD_LRS`, `UltraSSD_LRS`, ...).
    #[serde(other)]
    Other,
}

/// OS disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OsDisk {
    /// Disk name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// OS type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_type: Option<OsPlatform>,
    /// Create option.
    pub create_option: DiskCreateOption,
    /// Host caching.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caching: Option<CachingType>,
    /// Managed disk parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub managed_disk: Option<ManagedDiskParameters>,
}

/// Managed disk parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedDiskParameters {
    /// Storage account type.
    pub storage_account_type: StorageAccountType,
    /// Disk resource ID (read-only).
    #[serde(skip_serializing)]
    pub id: Option<String>,
}

/// OS profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OsProfile {
    /// Computer name.
    pub computer_name: String,
    /// Admin username.
    pub admin_username: String,
    /// Admin password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,
    /// Linux configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linux_configuration: Option<LinuxConfiguration>,
    /// Custom data (cloud-init, base64 encoded).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<String>,
}

/// Linux configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinuxConfiguration {
    /// Disable password authentication.
    pub disable_password_authentication: bool,
    /// SSH configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh: Option<SshConfiguration>,
}

/// SSH configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SshConfiguration {
    /// Public keys.
    pub public_keys: Vec<SshPublicKey>,
}

/// SSH public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SshPublicKey {
    /// Path (e.g., `/home/azureuser/.ssh/authorized_keys`).
    pub path: String,
    /// Key data.
    pub key_data: String,
}

/// Network profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkProfile {
    /// Network interfaces.
    pub network_interfaces: Vec<NetworkInterfaceReference>,
}

/// Network interface reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkInterfaceReference {
    /// Network interface ID.
    pub id: String,
    /// Properties.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<NetworkInterfaceReferenceProperties>,
}

/// Network interface reference properties.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterfaceReferenceProperties {
    /// Primary.
    pub primary: Option<bool>,
}

/// Instance view.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceView {
    /// Runtime statuses (provisioning and power state).
    #[serde(default)]
    pub statuses: Vec<InstanceViewStatus>,
}

/// Instance view status.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceViewStatus {
    /// Status code, e.g. `PowerState/running`.
    #[serde(default)]
    pub code: String,
    /// Display status.
    pub display_status: Option<String>,
}

/// VM size offered in a region.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineSize {
    /// Size name, e.g. `Standard_D4s_v5`.
    pub name: String,
    /// Number of vCPUs.
    #[serde(default)]
    pub number_of_cores: u32,
    /// Memory in MB.
    #[serde(default, rename = "memoryInMB")]
    pub memory_in_mb: u64,
    /// Maximum attachable data disks.
    #[serde(default)]
    pub max_data_disk_count: u32,
    /// OS disk size in MB.
    #[serde(default, rename = "osDiskSizeInMB")]
    pub os_disk_size_in_mb: u64,
    /// Resource (temp) disk size in MB.
    #[serde(default, rename = "resourceDiskSizeInMB")]
    pub resource_disk_size_in_mb: u64,
}

// ============================================================================
// Extension types
// ============================================================================

/// VM extension.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineExtension {
    /// Resource ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Extension name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Location.
    pub location: String,
    /// Properties.
    pub properties: VirtualMachineExtensionProperties,
}

/// VM extension properties.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineExtensionProperties {
    /// Extension publisher.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    /// Extension handler type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub extension_type: Option<String>,
    /// Handler version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_handler_version: Option<String>,
    /// Allow minor version upgrades.
    #[serde(default)]
    pub auto_upgrade_minor_version: bool,
    /// Public settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<CustomScriptSettings>,
    /// Provisioning state (read-only).
    #[serde(skip_serializing)]
    pub provisioning_state: Option<String>,
}

/// Public settings of the custom script extension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomScriptSettings {
    /// Command line to run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_to_execute: Option<String>,
    /// Script files downloaded before the command runs.
    #[serde(default)]
    pub file_uris: Vec<String>,
}

// ============================================================================
// Network types
// ============================================================================

/// IP address allocation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IpAllocationMethod {
    /// Address fixed at creation.
    Static,
    /// Address assigned by the platform.
    Dynamic,
}

impl fmt::Display for IpAllocationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static => write!(f, "Static"),
            Self::Dynamic => write!(f, "Dynamic"),
        }
    }
}

/// Public IP address.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicIpAddress {
    /// Resource ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Location.
    #[serde(default)]
    pub location: String,
    /// Properties.
    #[serde(default)]
    pub properties: PublicIpAddressProperties,
}

/// Public IP address properties.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublicIpAddressProperties {
    /// Allocation method.
    #[serde(
        rename = "publicIPAllocationMethod",
        skip_serializing_if = "Option::is_none"
    )]
    pub public_ip_allocation_method: Option<IpAllocationMethod>,
    /// Assigned address (read-only).
    #[serde(rename = "ipAddress", skip_serializing)]
    pub ip_address: Option<String>,
    /// Provisioning state (read-only).
    #[serde(rename = "provisioningState", skip_serializing)]
    pub provisioning_state: Option<String>,
}

/// Network interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    /// Resource ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Location.
    #[serde(default)]
    pub location: String,
    /// Properties.
    #[serde(default)]
    pub properties: NetworkInterfaceProperties,
}

/// Network interface properties.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterfaceProperties {
    /// IP configurations.
    #[serde(default)]
    pub ip_configurations: Vec<NetworkInterfaceIpConfiguration>,
    /// Provisioning state (read-only).
    #[serde(skip_serializing)]
    pub provisioning_state: Option<String>,
}

/// IP configuration of a network interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkInterfaceIpConfiguration {
    /// Resource ID (read-only).
    #[serde(skip_serializing)]
    pub id: Option<String>,
    /// Configuration name.
    pub name: String,
    /// Properties.
    #[serde(default)]
    pub properties: IpConfigurationProperties,
}

/// IP configuration properties.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IpConfigurationProperties {
    /// Private IP allocation method.
    #[serde(
        rename = "privateIPAllocationMethod",
        skip_serializing_if = "Option::is_none"
    )]
    pub private_ip_allocation_method: Option<IpAllocationMethod>,
    /// Private IP address.
    #[serde(rename = "privateIPAddress", skip_serializing_if = "Option::is_none")]
    pub private_ip_address: Option<String>,
    /// Subnet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet: Option<SubResource>,
    /// Public IP address.
    #[serde(rename = "publicIPAddress", skip_serializing_if = "Option::is_none")]
    pub public_ip_address: Option<SubResource>,
}

/// Virtual network.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetwork {
    /// Resource ID.
    pub id: String,
    /// Name.
    pub name: String,
    /// Location.
    #[serde(default)]
    pub location: String,
    /// Properties.
    #[serde(default)]
    pub properties: VirtualNetworkProperties,
}

/// Virtual network properties.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkProperties {
    /// Address space.
    pub address_space: Option<AddressSpace>,
    /// Subnets.
    #[serde(default)]
    pub subnets: Vec<Subnet>,
}

/// Address space.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSpace {
    /// CIDR prefixes.
    #[serde(default)]
    pub address_prefixes: Vec<String>,
}

/// Subnet.
#[derive(Debug, Clone, Deserialize)]
pub struct Subnet {
    /// Resource ID.
    pub id: String,
    /// Name.
    pub name: String,
    /// Properties.
    #[serde(default)]
    pub properties: SubnetProperties,
}

/// Subnet properties.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetProperties {
    /// CIDR prefix.
    pub address_prefix: Option<String>,
}

// ============================================================================
// Resource and storage types
// ============================================================================

/// Resource group.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceGroup {
    /// Resource ID.
    pub id: String,
    /// Name.
    pub name: String,
    /// Location.
    pub location: String,
}

/// Storage account.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageAccount {
    /// Resource ID.
    pub id: String,
    /// Name.
    pub name: String,
    /// Location.
    pub location: String,
    /// Account kind, e.g. `StorageV2`.
    pub kind: Option<String>,
    /// SKU.
    pub sku: Option<Sku>,
}

/// SKU.
#[derive(Debug, Clone, Deserialize)]
pub struct Sku {
    /// SKU name, e.g. `Standard_LRS`.
    pub name: String,
    /// Tier.
    pub tier: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_ip_uses_arm_key_names() {
        let pip = PublicIpAddress {
            id: None,
            name: None,
            location: "eastus".to_string(),
            properties: PublicIpAddressProperties {
                public_ip_allocation_method: Some(IpAllocationMethod::Static),
                ip_address: Some("20.1.2.3".to_string()),
                provisioning_state: None,
            },
        };

        let json = serde_json::to_value(&pip).unwrap();
        assert_eq!(json["properties"]["publicIPAllocationMethod"], "Static");
        // read-only fields are never sent
        assert!(json["properties"].get("ipAddress").is_none());
    }

    #[test]
    fn test_vm_with_instance_view_deserializes() {
        let body = r#"{
            "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines/vm1",
            "name": "vm1",
            "location": "eastus",
            "properties": {
                "provisioningState": "Succeeded",
                "vmId": "0f5f7c4e",
                "hardwareProfile": { "vmSize": "Standard_B1s" },
                "instanceView": {
                    "statuses": [
                        { "code": "ProvisioningState/succeeded" },
                        { "code": "PowerState/running", "displayStatus": "VM running" }
                    ]
                }
            }
        }"#;

        let vm: VirtualMachine = serde_json::from_str(body).unwrap();
        assert_eq!(vm.name.as_deref(), Some("vm1"));
        assert_eq!(vm.properties.provisioning_state.as_deref(), Some("Succeeded"));
        let view = vm.properties.instance_view.unwrap();
        assert_eq!(view.statuses.len(), 2);
        assert_eq!(view.statuses[1].code, "PowerState/running");
    }

    #[test]
    fn test_vm_size_memory_key() {
        let size: VirtualMachineSize = serde_json::from_str(
            r#"{"name":"Standard_B2s","numberOfCores":2,"memoryInMB":4096,"maxDataDiskCount":4}"#,
        )
        .unwrap();
        assert_eq!(size.memory_in_mb, 4096);
        assert_eq!(size.os_disk_size_in_mb, 0);
    }
}
