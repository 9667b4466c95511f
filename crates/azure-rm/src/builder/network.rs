//! Network profile, NIC and public IP payloads.

use crate::models::{
    IpAllocationMethod, IpConfigurationProperties, NetworkInterface,
    NetworkInterfaceIpConfiguration, NetworkInterfaceProperties, NetworkInterfaceReference,
    NetworkInterfaceReferenceProperties, NetworkProfile, PublicIpAddress,
    PublicIpAddressProperties, SubResource,
};
use crate::request::{InterfacePlan, PrivateIpAllocation};

/// Name of the `index`-th NIC of a VM.
#[must_use]
pub fn nic_name(vm_name: &str, index: usize) -> String {
    format!("{vm_name}-nic{index}")
}

/// Name of the public IP of the `index`-th NIC of a VM.
#[must_use]
pub fn public_ip_name(vm_name: &str, index: usize) -> String {
    format!("{vm_name}-pip{index}")
}

/// Network profile referencing existing NICs. The first is primary.
#[must_use]
pub fn build_network_profile(nic_ids: &[String]) -> NetworkProfile {
    NetworkProfile {
        network_interfaces: nic_ids
            .iter()
            .enumerate()
            .map(|(index, id)| NetworkInterfaceReference {
                id: id.clone(),
                properties: Some(NetworkInterfaceReferenceProperties {
                    primary: Some(index == 0),
                }),
            })
            .collect(),
    }
}

/// Public IP payload.
#[must_use]
pub fn build_public_ip(location: &str, allocation: IpAllocationMethod) -> PublicIpAddress {
    PublicIpAddress {
        id: None,
        name: None,
        location: location.to_string(),
        properties: PublicIpAddressProperties {
            public_ip_allocation_method: Some(allocation),
            ip_address: None,
            provisioning_state: None,
        },
    }
}

/// NIC payload with a single IP configuration named after the NIC.
#[must_use]
pub fn build_network_interface(
    name: &str,
    location: &str,
    plan: &InterfacePlan,
    public_ip_id: Option<&str>,
) -> NetworkInterface {
    let (allocation, address) = match &plan.private_ip {
        PrivateIpAllocation::Static(ip) => (IpAllocationMethod::Static, Some(ip.clone())),
        PrivateIpAllocation::Dynamic => (IpAllocationMethod::Dynamic, None),
    };

    NetworkInterface {
        id: None,
        name: None,
        location: location.to_string(),
        properties: NetworkInterfaceProperties {
            ip_configurations: vec![NetworkInterfaceIpConfiguration {
                id: None,
                name: name.to_string(),
                properties: IpConfigurationProperties {
                    private_ip_allocation_method: Some(allocation),
                    private_ip_address: address,
                    subnet: Some(SubResource::new(&plan.subnet_id)),
                    public_ip_address: public_ip_id.map(SubResource::new),
                },
            }],
            provisioning_state: None,
        },
    }
}
