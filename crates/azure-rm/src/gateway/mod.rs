//! Provider gateway for Azure Resource Manager.
//!
//! [`AzureGateway`] authenticates once per service principal and exposes one
//! method per remote operation. Errors from Azure are surfaced as-is, with no
//! retries.
//!
//! ## Sub-clients
//!
//! - [`ComputeClient`] - VMs, extensions, sizes, disks
//! - [`NetworkClient`] - public IPs, NICs, virtual networks
//! - [`ResourceClient`] - resource groups
//! - [`StorageClient`] - storage accounts

mod auth;
mod client;
mod compute;
mod network;
mod resources;
mod traits;
mod transport;

pub use client::AzureGateway;
pub use compute::ComputeClient;
pub use network::NetworkClient;
pub use resources::{ResourceClient, StorageClient};
pub use traits::{AzureError, ResourceManager};

use crate::models::VirtualMachine;

/// Power state token from a VM's instance view.
///
/// Scans the statuses for a code containing `PowerState` and returns the part
/// after the `/` (`"PowerState/running"` -> `"running"`). When several match,
/// the last one wins. Returns `None` without an instance view or match.
#[must_use]
pub fn power_state(vm: &VirtualMachine) -> Option<String> {
    vm.properties
        .instance_view
        .as_ref()?
        .statuses
        .iter()
        .filter(|status| status.code.contains("PowerState"))
        .filter_map(|status| status.code.split('/').nth(1))
        .last()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InstanceView, InstanceViewStatus};

    fn vm_with_statuses(codes: &[&str]) -> VirtualMachine {
        let mut vm = VirtualMachine::default();
        vm.properties.instance_view = Some(InstanceView {
            statuses: codes
                .iter()
                .map(|code| InstanceViewStatus {
                    code: (*code).to_string(),
                    display_status: None,
                })
                .collect(),
        });
        vm
    }

    #[test]
    fn test_power_state_extracts_token() {
        let vm = vm_with_statuses(&["ProvisioningState/succeeded", "PowerState/deallocated"]);
        assert_eq!(power_state(&vm).as_deref(), Some("deallocated"));
    }

    #[test]
    fn test_power_state_absent() {
        let vm = vm_with_statuses(&["ProvisioningState/creating"]);
        assert_eq!(power_state(&vm), None);
        assert_eq!(power_state(&VirtualMachine::default()), None);
    }
}
