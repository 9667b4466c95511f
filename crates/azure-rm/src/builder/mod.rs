//! Request builder: flat request fields to ARM payloads.
//!
//! Everything here is pure. Configuration errors (bad image locator, bad
//! public IP mode) surface before anything is sent to Azure.

mod extension;
mod image;
mod network;
mod os_profile;
mod storage;

pub use extension::{build_extension, custom_script_handler, CUSTOM_SCRIPT_EXTENSION_NAME};
pub use image::build_image_reference;
pub use network::{
    build_network_interface, build_network_profile, build_public_ip, nic_name, public_ip_name,
};
pub use os_profile::{authorized_keys_path, build_os_profile};
pub use storage::{build_storage_profile, caching_type, os_disk_name, storage_account_type};

use crate::gateway::AzureError;
use crate::models::{HardwareProfile, SubResource, VirtualMachine, VirtualMachineProperties};
use crate::request::ProvisionRequest;
use crate::ssh::KeyPair;

/// Full create-VM payload.
///
/// # Errors
/// Returns [`AzureError::InvalidImageReference`] for a malformed image
/// locator.
pub fn build_vm(request: &ProvisionRequest, key_pair: &KeyPair) -> Result<VirtualMachine, AzureError> {
    let mut storage_profile = build_storage_profile(
        &request.name,
        request.os_disk_caching.as_deref(),
        request.platform,
        request.premium_os_disk.as_deref(),
    );
    storage_profile.image_reference = Some(build_image_reference(&request.image)?);

    Ok(VirtualMachine {
        id: None,
        name: None,
        location: request.location.clone(),
        tags: std::collections::HashMap::new(),
        properties: VirtualMachineProperties {
            hardware_profile: Some(HardwareProfile {
                vm_size: request.vm_size.clone(),
            }),
            storage_profile: Some(storage_profile),
            os_profile: Some(build_os_profile(request, key_pair)),
            network_profile: Some(build_network_profile(&request.network_interface_ids)),
            availability_set: request
                .availability_set_id
                .as_ref()
                .map(SubResource::new),
            ..VirtualMachineProperties::default()
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OsPlatform;

    fn request() -> ProvisionRequest {
        ProvisionRequest {
            name: "app-1".to_string(),
            resource_group: "rg-app".to_string(),
            location: "eastus".to_string(),
            platform: OsPlatform::Linux,
            username: "azureuser".to_string(),
            vm_size: "Standard_D4s_v5".to_string(),
            image: "Canonical:UbuntuServer:18.04-LTS:latest".to_string(),
            network_interface_ids: vec!["/nics/app-1-nic0".to_string()],
            ..ProvisionRequest::default()
        }
    }

    fn key_pair() -> KeyPair {
        KeyPair::new("ssh-rsa AAAAlocal").unwrap()
    }

    #[test]
    fn test_build_vm_payload() {
        let vm = build_vm(&request(), &key_pair()).unwrap();
        let json = serde_json::to_value(&vm).unwrap();
        let props = &json["properties"];

        assert_eq!(json["location"], "eastus");
        assert_eq!(props["hardwareProfile"]["vmSize"], "Standard_D4s_v5");
        assert_eq!(props["storageProfile"]["imageReference"]["publisher"], "Canonical");
        assert_eq!(props["storageProfile"]["osDisk"]["name"], "app-1-osdisk");
        assert_eq!(props["storageProfile"]["osDisk"]["caching"], "ReadWrite");
        assert_eq!(
            props["storageProfile"]["osDisk"]["managedDisk"]["storageAccountType"],
            "Standard_LRS"
        );
        assert_eq!(props["osProfile"]["computerName"], "app-1");
        assert_eq!(props["networkProfile"]["networkInterfaces"][0]["id"], "/nics/app-1-nic0");
        assert!(props.get("availabilitySet").is_none());
        // read-only fields never go out
        assert!(props.get("provisioningState").is_none());
        assert!(props.get("instanceView").is_none());
    }

    #[test]
    fn test_availability_set_attached() {
        let mut req = request();
        req.availability_set_id = Some("/availabilitySets/as-1".to_string());
        let vm = build_vm(&req, &key_pair()).unwrap();
        assert_eq!(
            vm.properties.availability_set,
            Some(SubResource::new("/availabilitySets/as-1"))
        );
    }

    #[test]
    fn test_bad_image_fails_build() {
        let mut req = request();
        req.image = "Canonical:UbuntuServer".to_string();
        assert!(matches!(
            build_vm(&req, &key_pair()),
            Err(AzureError::InvalidImageReference(_))
        ));
    }
}
