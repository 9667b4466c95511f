//! Flat provisioning request fields, as supplied by the caller.
//!
//! These mirror a VM definition form: mostly strings, some of them
//! boolean-like. The [`builder`](crate::builder) turns them into ARM models.

use serde::{Deserialize, Serialize};

use crate::gateway::AzureError;
use crate::models::{IpAllocationMethod, OsPlatform};

/// Everything needed to create one VM.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionRequest {
    /// VM name, also used as computer name and resource name prefix.
    pub name: String,
    /// Resource group for the VM and its NICs, public IPs and disk.
    pub resource_group: String,
    /// Azure location, e.g. `eastus`.
    pub location: String,
    /// Guest OS family.
    pub platform: OsPlatform,
    /// Admin username.
    pub username: String,
    /// Admin password.
    pub password: Option<String>,
    /// Extra SSH public key authorized for the admin user.
    pub ssh_key_data: Option<String>,
    /// Disallow password logins.
    pub disable_password_authentication: bool,
    /// Raw cloud-init / custom data. Base64-encoded by the builder.
    pub custom_data: Option<String>,
    /// VM size, e.g. `Standard_B2s`.
    pub vm_size: String,
    /// OS disk caching: `None`, `ReadOnly` or `ReadWrite`.
    pub os_disk_caching: Option<String>,
    /// `"true"` selects a Premium OS disk.
    pub premium_os_disk: Option<String>,
    /// Marketplace URN (`publisher:offer:sku:version`) or managed image ID.
    pub image: String,
    /// IDs of existing NICs to attach, primary first.
    pub network_interface_ids: Vec<String>,
    /// Availability set to place the VM in.
    pub availability_set_id: Option<String>,
    /// NICs to create before the VM.
    pub interfaces: Vec<NetworkInterfaceSpec>,
    /// Command run by the custom script extension.
    pub script_command: Option<String>,
    /// Comma-separated script URIs for the custom script extension.
    pub script_uris: Option<String>,
}

impl ProvisionRequest {
    /// Custom script extension fields of this request.
    #[must_use]
    pub fn extension_spec(&self) -> ExtensionSpec {
        ExtensionSpec {
            script_command: self.script_command.clone(),
            script_uris: self.script_uris.clone(),
            platform: self.platform,
        }
    }
}

/// One NIC to create, in form-field shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkInterfaceSpec {
    /// Subnet resource ID.
    pub network: String,
    /// Public IP mode: `Static`, `Dynamic` or `None`. There is no default;
    /// leaving it out is an error.
    #[serde(default)]
    pub public_ip: Option<String>,
    /// `"false"` requests a dynamic private IP; anything else a static one.
    /// When absent, static is used only if `ip` is set.
    #[serde(default)]
    pub private_ip: Option<String>,
    /// Static private IP address.
    #[serde(default)]
    pub ip: Option<String>,
}

/// Private IP assignment of a NIC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrivateIpAllocation {
    /// Fixed address.
    Static(String),
    /// Assigned by Azure.
    Dynamic,
}

/// A [`NetworkInterfaceSpec`] whose fields have been validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfacePlan {
    /// Subnet resource ID.
    pub subnet_id: String,
    /// Private IP assignment.
    pub private_ip: PrivateIpAllocation,
    /// Public IP allocation, `None` for no public IP.
    pub public_ip: Option<IpAllocationMethod>,
}

impl NetworkInterfaceSpec {
    /// Parse the public IP mode.
    ///
    /// # Errors
    /// Returns [`AzureError::InvalidPublicIpMode`] for anything other than
    /// `Static`, `Dynamic` or `None`.
    pub fn public_ip_allocation(&self) -> Result<Option<IpAllocationMethod>, AzureError> {
        match self.public_ip.as_deref() {
            Some("Static") => Ok(Some(IpAllocationMethod::Static)),
            Some("Dynamic") => Ok(Some(IpAllocationMethod::Dynamic)),
            Some("None") => Ok(None),
            other => Err(AzureError::InvalidPublicIpMode(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    /// Resolve the private IP assignment.
    ///
    /// # Errors
    /// Returns [`AzureError::Config`] when a static address is requested but
    /// `ip` is missing.
    pub fn private_ip_allocation(&self) -> Result<PrivateIpAllocation, AzureError> {
        let wants_static = match self.private_ip.as_deref() {
            Some("false") => false,
            Some(_) => true,
            None => self.ip.is_some(),
        };

        if !wants_static {
            return Ok(PrivateIpAllocation::Dynamic);
        }

        match self.ip.as_deref().map(str::trim) {
            Some(ip) if !ip.is_empty() => Ok(PrivateIpAllocation::Static(ip.to_string())),
            _ => Err(AzureError::Config(format!(
                "Static private IP on subnet '{}' requires an address",
                self.network
            ))),
        }
    }

    /// Validate every field.
    ///
    /// # Errors
    /// Returns the first configuration error found.
    pub fn resolve(&self) -> Result<InterfacePlan, AzureError> {
        if self.network.trim().is_empty() {
            return Err(AzureError::Config(
                "Network interface needs a subnet ID".to_string(),
            ));
        }

        Ok(InterfacePlan {
            subnet_id: self.network.clone(),
            private_ip: self.private_ip_allocation()?,
            public_ip: self.public_ip_allocation()?,
        })
    }
}

/// Custom script extension input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionSpec {
    /// Command line to run.
    pub script_command: Option<String>,
    /// Comma-separated script URIs.
    pub script_uris: Option<String>,
    /// Guest OS family.
    pub platform: OsPlatform,
}

impl ExtensionSpec {
    /// Whether there is anything to run.
    #[must_use]
    pub fn is_present(&self) -> bool {
        let present = |field: &Option<String>| field.as_deref().is_some_and(|v| !v.trim().is_empty());
        present(&self.script_command) || present(&self.script_uris)
    }
}
