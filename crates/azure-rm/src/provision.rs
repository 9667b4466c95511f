//! Provisioning sequence: public IPs and NICs, then the VM, then the custom
//! script extension.
//!
//! Nothing is rolled back on failure. When a sequence stops part way, the
//! error lists what had already been created so the caller can clean up.

use tracing::{info, warn};

use crate::builder::{
    build_extension, build_image_reference, build_network_interface, build_public_ip, build_vm,
    nic_name, os_disk_name, public_ip_name, CUSTOM_SCRIPT_EXTENSION_NAME,
};
use crate::gateway::{AzureError, ResourceManager};
use crate::models::{NetworkInterface, PublicIpAddress, VirtualMachine, VirtualMachineExtension};
use crate::request::{InterfacePlan, ProvisionRequest};
use crate::ssh::KeyPair;

/// Resources created by [`Provisioner::provision`].
#[derive(Debug, Clone)]
pub struct ProvisionedVm {
    /// The VM as returned by Azure.
    pub vm: VirtualMachine,
    /// NICs created for the VM, primary first.
    pub nics: Vec<NetworkInterface>,
    /// Public IPs created for those NICs.
    pub public_ips: Vec<PublicIpAddress>,
    /// Custom script extension, if one was requested.
    pub extension: Option<VirtualMachineExtension>,
}

/// Last path segment of a resource ID.
fn resource_name(id: &str) -> &str {
    id.rsplit('/').next().unwrap_or(id)
}

fn require_id(id: Option<&String>, kind: &str, name: &str) -> Result<String, AzureError> {
    id.cloned().ok_or_else(|| {
        AzureError::UnexpectedResponse(format!("{kind} '{name}' returned without a resource ID"))
    })
}

fn partial(created: Vec<String>, error: AzureError) -> AzureError {
    if created.is_empty() {
        error
    } else {
        warn!(created = ?created, error = %error, "Provisioning stopped part way");
        AzureError::PartialProvision {
            created,
            source: Box::new(error),
        }
    }
}

/// Drives a [`ResourceManager`] through VM creation and teardown.
pub struct Provisioner<R> {
    manager: R,
    key_pair: KeyPair,
}

impl<R: ResourceManager> Provisioner<R> {
    /// Create a provisioner that authorizes `key_pair` on every VM.
    pub fn new(manager: R, key_pair: KeyPair) -> Self {
        Self { manager, key_pair }
    }

    /// Underlying resource manager.
    pub fn manager(&self) -> &R {
        &self.manager
    }

    /// Validate every interface of a request.
    fn plan_interfaces(request: &ProvisionRequest) -> Result<Vec<InterfacePlan>, AzureError> {
        request
            .interfaces
            .iter()
            .map(crate::request::NetworkInterfaceSpec::resolve)
            .collect()
    }

    async fn create_nics_tracked(
        &self,
        request: &ProvisionRequest,
        plans: &[InterfacePlan],
        created: &mut Vec<String>,
    ) -> Result<(Vec<NetworkInterface>, Vec<PublicIpAddress>), AzureError> {
        let mut nics = Vec::with_capacity(plans.len());
        let mut public_ips = Vec::new();

        for (index, plan) in plans.iter().enumerate() {
            let public_ip_id = if let Some(allocation) = plan.public_ip {
                let name = public_ip_name(&request.name, index);
                let pip = self
                    .manager
                    .create_or_update_public_ip(
                        &request.resource_group,
                        &name,
                        &build_public_ip(&request.location, allocation),
                    )
                    .await?;
                let id = require_id(pip.id.as_ref(), "Public IP", &name)?;
                created.push(id.clone());
                public_ips.push(pip);
                Some(id)
            } else {
                None
            };

            let name = nic_name(&request.name, index);
            let nic = self
                .manager
                .create_or_update_nic(
                    &request.resource_group,
                    &name,
                    &build_network_interface(&name, &request.location, plan, public_ip_id.as_deref()),
                )
                .await?;
            created.push(require_id(nic.id.as_ref(), "Network interface", &name)?);
            nics.push(nic);
        }

        Ok((nics, public_ips))
    }

    /// Create the NICs (and their public IPs) described by a request.
    ///
    /// Every interface is validated before the first remote call.
    ///
    /// # Errors
    /// Returns a configuration error for an invalid interface, or the remote
    /// error, wrapped in [`AzureError::PartialProvision`] if some resources
    /// were already created.
    pub async fn create_nics(
        &self,
        request: &ProvisionRequest,
    ) -> Result<Vec<NetworkInterface>, AzureError> {
        let plans = Self::plan_interfaces(request)?;
        let mut created = Vec::new();

        self.create_nics_tracked(request, &plans, &mut created)
            .await
            .map(|(nics, _)| nics)
            .map_err(|e| partial(created, e))
    }

    /// Create the VM attached to `request.network_interface_ids`.
    ///
    /// # Errors
    /// Returns a configuration error for a bad image locator, or the remote
    /// error.
    pub async fn create_managed_vm(
        &self,
        request: &ProvisionRequest,
    ) -> Result<VirtualMachine, AzureError> {
        info!(
            vm_name = %request.name,
            resource_group = %request.resource_group,
            "Creating virtual machine"
        );

        let vm = build_vm(request, &self.key_pair)?;
        self.manager
            .create_or_update_vm(&request.resource_group, &request.name, &vm)
            .await
    }

    /// Attach the custom script extension, if the request has a script.
    ///
    /// # Errors
    /// Propagates the remote error.
    pub async fn create_vm_extension(
        &self,
        request: &ProvisionRequest,
    ) -> Result<Option<VirtualMachineExtension>, AzureError> {
        let Some(extension) = build_extension(&request.location, &request.extension_spec()) else {
            return Ok(None);
        };

        let created = self
            .manager
            .create_or_update_vm_extension(
                &request.resource_group,
                &request.name,
                CUSTOM_SCRIPT_EXTENSION_NAME,
                &extension,
            )
            .await?;
        Ok(Some(created))
    }

    /// Run the whole sequence: NICs, VM, extension.
    ///
    /// NICs listed in `request.network_interface_ids` are attached after the
    /// ones created here.
    ///
    /// # Errors
    /// Configuration errors are returned before any remote call. Remote
    /// errors after the first successful creation are wrapped in
    /// [`AzureError::PartialProvision`].
    pub async fn provision(&self, request: &ProvisionRequest) -> Result<ProvisionedVm, AzureError> {
        let plans = Self::plan_interfaces(request)?;
        build_image_reference(&request.image)?;

        let mut created = Vec::new();
        match self.provision_tracked(request, &plans, &mut created).await {
            Ok(provisioned) => {
                info!(vm_name = %request.name, resources = created.len(), "VM provisioned");
                Ok(provisioned)
            }
            Err(e) => Err(partial(created, e)),
        }
    }

    async fn provision_tracked(
        &self,
        request: &ProvisionRequest,
        plans: &[InterfacePlan],
        created: &mut Vec<String>,
    ) -> Result<ProvisionedVm, AzureError> {
        let (nics, public_ips) = self.create_nics_tracked(request, plans, created).await?;

        let mut vm_request = request.clone();
        let mut nic_ids: Vec<String> = nics.iter().filter_map(|nic| nic.id.clone()).collect();
        nic_ids.extend(request.network_interface_ids.iter().cloned());
        vm_request.network_interface_ids = nic_ids;

        let vm = self.create_managed_vm(&vm_request).await?;
        created.push(
            vm.id
                .clone()
                .unwrap_or_else(|| format!("virtualMachines/{}", request.name)),
        );

        let extension = self.create_vm_extension(request).await?;

        Ok(ProvisionedVm {
            vm,
            nics,
            public_ips,
            extension,
        })
    }

    /// Delete a VM and everything created alongside it. See [`destroy_vm`].
    ///
    /// # Errors
    /// Stops at and returns the first remote error.
    pub async fn destroy_vm(&self, resource_group: &str, name: &str) -> Result<(), AzureError> {
        destroy_vm(&self.manager, resource_group, name).await
    }
}

/// Delete a VM and everything created alongside it: the VM first, then its
/// NICs, their public IPs and finally the OS disk.
///
/// # Errors
/// Stops at and returns the first remote error.
pub async fn destroy_vm<R>(manager: &R, resource_group: &str, name: &str) -> Result<(), AzureError>
where
    R: ResourceManager + ?Sized,
{
    info!(vm_name = %name, resource_group = %resource_group, "Destroying virtual machine");

    let vm = manager.get_vm(resource_group, name).await?;
    let nic_ids: Vec<String> = vm
        .properties
        .network_profile
        .as_ref()
        .map(|profile| {
            profile
                .network_interfaces
                .iter()
                .map(|nic| nic.id.clone())
                .collect()
        })
        .unwrap_or_default();
    let disk_name = vm
        .properties
        .storage_profile
        .as_ref()
        .and_then(|sp| sp.os_disk.as_ref())
        .and_then(|disk| disk.name.clone())
        .unwrap_or_else(|| os_disk_name(name));

    manager.delete_vm(resource_group, name).await?;

    for nic_id in &nic_ids {
        let interface_name = resource_name(nic_id);
        let nic = manager.get_nic(resource_group, interface_name).await?;
        let public_ip_ids: Vec<String> = nic
            .properties
            .ip_configurations
            .iter()
            .filter_map(|config| config.properties.public_ip_address.as_ref())
            .map(|pip| pip.id.clone())
            .collect();

        manager.delete_nic(resource_group, interface_name).await?;
        for pip_id in &public_ip_ids {
            manager
                .delete_public_ip(resource_group, resource_name(pip_id))
                .await?;
        }
    }

    manager.delete_disk(resource_group, &disk_name).await?;

    info!(vm_name = %name, "Virtual machine destroyed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::models::{
        InstanceView, InstanceViewStatus, IpConfigurationProperties, NetworkInterfaceIpConfiguration,
        NetworkInterfaceReference, NetworkProfile, OsPlatform, SubResource,
    };
    use crate::request::NetworkInterfaceSpec;

    /// Records every call; optionally fails one operation.
    #[derive(Default)]
    struct RecordingManager {
        calls: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl RecordingManager {
        fn failing(op: &'static str) -> Self {
            Self {
                fail_on: Some(op),
                ..Self::default()
            }
        }

        fn record(&self, op: &str, detail: &str) -> Result<(), AzureError> {
            self.calls.lock().unwrap().push(format!("{op} {detail}"));
            if self.fail_on == Some(op) {
                return Err(AzureError::Api {
                    status: 409,
                    message: format!("{op} rejected"),
                });
            }
            Ok(())
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn id(kind: &str, name: &str) -> String {
        format!("/subscriptions/s/resourceGroups/rg/providers/{kind}/{name}")
    }

    #[async_trait]
    impl ResourceManager for RecordingManager {
        async fn create_or_update_vm(
            &self,
            _rg: &str,
            name: &str,
            vm: &VirtualMachine,
        ) -> Result<VirtualMachine, AzureError> {
            self.record("create_vm", name)?;
            let mut created = vm.clone();
            created.id = Some(id("Microsoft.Compute/virtualMachines", name));
            Ok(created)
        }

        async fn get_vm(&self, _rg: &str, name: &str) -> Result<VirtualMachine, AzureError> {
            self.record("get_vm", name)?;
            let mut vm = VirtualMachine::default();
            vm.properties.network_profile = Some(NetworkProfile {
                network_interfaces: vec![NetworkInterfaceReference {
                    id: id("Microsoft.Network/networkInterfaces", &format!("{name}-nic0")),
                    properties: None,
                }],
            });
            Ok(vm)
        }

        async fn get_vm_instance_view(
            &self,
            _rg: &str,
            name: &str,
        ) -> Result<VirtualMachine, AzureError> {
            self.record("get_vm_instance_view", name)?;
            let mut vm = VirtualMachine::default();
            vm.properties.instance_view = Some(InstanceView {
                statuses: vec![InstanceViewStatus {
                    code: "PowerState/stopped".to_string(),
                    display_status: None,
                }],
            });
            Ok(vm)
        }

        async fn delete_vm(&self, _rg: &str, name: &str) -> Result<(), AzureError> {
            self.record("delete_vm", name)
        }

        async fn start_vm(&self, _rg: &str, name: &str) -> Result<(), AzureError> {
            self.record("start_vm", name)
        }

        async fn power_off_vm(&self, _rg: &str, name: &str) -> Result<(), AzureError> {
            self.record("power_off_vm", name)
        }

        async fn deallocate_vm(&self, _rg: &str, name: &str) -> Result<(), AzureError> {
            self.record("deallocate_vm", name)
        }

        async fn create_or_update_vm_extension(
            &self,
            _rg: &str,
            vm_name: &str,
            extension_name: &str,
            extension: &VirtualMachineExtension,
        ) -> Result<VirtualMachineExtension, AzureError> {
            self.record("create_extension", &format!("{vm_name}/{extension_name}"))?;
            Ok(extension.clone())
        }

        async fn create_or_update_public_ip(
            &self,
            _rg: &str,
            name: &str,
            public_ip: &PublicIpAddress,
        ) -> Result<PublicIpAddress, AzureError> {
            let method = public_ip
                .properties
                .public_ip_allocation_method
                .map(|m| m.to_string())
                .unwrap_or_default();
            self.record("create_public_ip", &format!("{name} {method}"))?;
            let mut created = public_ip.clone();
            created.id = Some(id("Microsoft.Network/publicIPAddresses", name));
            Ok(created)
        }

        async fn delete_public_ip(&self, _rg: &str, name: &str) -> Result<(), AzureError> {
            self.record("delete_public_ip", name)
        }

        async fn create_or_update_nic(
            &self,
            _rg: &str,
            name: &str,
            nic: &NetworkInterface,
        ) -> Result<NetworkInterface, AzureError> {
            let pip = nic.properties.ip_configurations[0]
                .properties
                .public_ip_address
                .as_ref()
                .map_or("-", |p| resource_name(&p.id))
                .to_string();
            self.record("create_nic", &format!("{name} {pip}"))?;
            let mut created = nic.clone();
            created.id = Some(id("Microsoft.Network/networkInterfaces", name));
            Ok(created)
        }

        async fn get_nic(&self, _rg: &str, name: &str) -> Result<NetworkInterface, AzureError> {
            self.record("get_nic", name)?;
            Ok(NetworkInterface {
                id: Some(id("Microsoft.Network/networkInterfaces", name)),
                name: Some(name.to_string()),
                location: "eastus".to_string(),
                properties: crate::models::NetworkInterfaceProperties {
                    ip_configurations: vec![NetworkInterfaceIpConfiguration {
                        id: None,
                        name: name.to_string(),
                        properties: IpConfigurationProperties {
                            public_ip_address: Some(SubResource::new(id(
                                "Microsoft.Network/publicIPAddresses",
                                &name.replace("-nic", "-pip"),
                            ))),
                            ..IpConfigurationProperties::default()
                        },
                    }],
                    provisioning_state: None,
                },
            })
        }

        async fn delete_nic(&self, _rg: &str, name: &str) -> Result<(), AzureError> {
            self.record("delete_nic", name)
        }

        async fn delete_disk(&self, _rg: &str, name: &str) -> Result<(), AzureError> {
            self.record("delete_disk", name)
        }
    }

    fn interface(public_ip: &str) -> NetworkInterfaceSpec {
        NetworkInterfaceSpec {
            network: id("Microsoft.Network/virtualNetworks", "vnet/subnets/default"),
            public_ip: Some(public_ip.to_string()),
            private_ip: None,
            ip: None,
        }
    }

    fn request(interfaces: Vec<NetworkInterfaceSpec>) -> ProvisionRequest {
        ProvisionRequest {
            name: "web".to_string(),
            resource_group: "rg".to_string(),
            location: "eastus".to_string(),
            platform: OsPlatform::Linux,
            username: "azureuser".to_string(),
            vm_size: "Standard_B2s".to_string(),
            image: "Canonical:UbuntuServer:18.04-LTS:latest".to_string(),
            interfaces,
            ..ProvisionRequest::default()
        }
    }

    fn provisioner(manager: RecordingManager) -> Provisioner<RecordingManager> {
        Provisioner::new(manager, KeyPair::new("ssh-rsa AAAAlocal").unwrap())
    }

    #[tokio::test]
    async fn test_no_public_ip_when_mode_is_none() {
        let p = provisioner(RecordingManager::default());
        let nics = p.create_nics(&request(vec![interface("None")])).await.unwrap();

        assert_eq!(nics.len(), 1);
        assert_eq!(p.manager().calls(), vec!["create_nic web-nic0 -"]);
    }

    #[tokio::test]
    async fn test_public_ip_created_before_nic() {
        let p = provisioner(RecordingManager::default());
        p.create_nics(&request(vec![interface("Static"), interface("Dynamic")]))
            .await
            .unwrap();

        assert_eq!(
            p.manager().calls(),
            vec![
                "create_public_ip web-pip0 Static",
                "create_nic web-nic0 web-pip0",
                "create_public_ip web-pip1 Dynamic",
                "create_nic web-nic1 web-pip1",
            ]
        );
    }

    #[tokio::test]
    async fn test_bad_public_ip_mode_fails_before_any_call() {
        let p = provisioner(RecordingManager::default());
        let err = p
            .create_nics(&request(vec![interface("Static"), interface("Elastic")]))
            .await
            .unwrap_err();

        assert!(matches!(err, AzureError::InvalidPublicIpMode(ref mode) if mode == "Elastic"));
        assert!(p.manager().calls().is_empty());
    }

    #[tokio::test]
    async fn test_stop_powers_off_then_deallocates() {
        let manager = RecordingManager::default();
        manager.stop_vm("rg", "web").await.unwrap();
        assert_eq!(manager.calls(), vec!["power_off_vm web", "deallocate_vm web"]);
    }

    #[tokio::test]
    async fn test_stop_leaves_vm_powered_off_when_deallocate_fails() {
        let manager = RecordingManager::failing("deallocate_vm");
        assert!(manager.stop_vm("rg", "web").await.is_err());
        assert_eq!(manager.calls(), vec!["power_off_vm web", "deallocate_vm web"]);
    }

    #[tokio::test]
    async fn test_check_vm_status_uses_instance_view() {
        let manager = RecordingManager::default();
        let state = manager.check_vm_status("rg", "web").await.unwrap();
        assert_eq!(state.as_deref(), Some("stopped"));
        assert_eq!(manager.calls(), vec!["get_vm_instance_view web"]);
    }

    #[tokio::test]
    async fn test_provision_full_sequence() {
        let p = provisioner(RecordingManager::default());
        let mut req = request(vec![interface("Dynamic")]);
        req.script_command = Some("sh init.sh".to_string());

        let provisioned = p.provision(&req).await.unwrap();

        assert_eq!(
            p.manager().calls(),
            vec![
                "create_public_ip web-pip0 Dynamic",
                "create_nic web-nic0 web-pip0",
                "create_vm web",
                format!("create_extension web/{CUSTOM_SCRIPT_EXTENSION_NAME}").as_str(),
            ]
        );
        let profile = provisioned.vm.properties.network_profile.unwrap();
        assert_eq!(
            profile.network_interfaces[0].id,
            id("Microsoft.Network/networkInterfaces", "web-nic0")
        );
        assert_eq!(provisioned.public_ips.len(), 1);
        assert!(provisioned.extension.is_some());
    }

    #[tokio::test]
    async fn test_provision_without_script_skips_extension() {
        let p = provisioner(RecordingManager::default());
        let provisioned = p.provision(&request(vec![interface("None")])).await.unwrap();

        assert!(provisioned.extension.is_none());
        assert_eq!(p.manager().calls(), vec!["create_nic web-nic0 -", "create_vm web"]);
    }

    #[tokio::test]
    async fn test_provision_reports_partial_failure() {
        let p = provisioner(RecordingManager::failing("create_vm"));
        let err = p.provision(&request(vec![interface("Static")])).await.unwrap_err();

        let AzureError::PartialProvision { created, source } = err else {
            panic!("expected partial provision error, got {err:?}");
        };
        assert_eq!(
            created,
            vec![
                id("Microsoft.Network/publicIPAddresses", "web-pip0"),
                id("Microsoft.Network/networkInterfaces", "web-nic0"),
            ]
        );
        assert!(matches!(*source, AzureError::Api { status: 409, .. }));
    }

    #[tokio::test]
    async fn test_first_failure_is_not_wrapped() {
        let p = provisioner(RecordingManager::failing("create_public_ip"));
        let err = p.provision(&request(vec![interface("Static")])).await.unwrap_err();
        assert!(matches!(err, AzureError::Api { .. }));
    }

    #[tokio::test]
    async fn test_bad_image_fails_before_any_call() {
        let p = provisioner(RecordingManager::default());
        let mut req = request(vec![interface("Static")]);
        req.image = "ubuntu".to_string();

        assert!(p.provision(&req).await.unwrap_err().is_config());
        assert!(p.manager().calls().is_empty());
    }

    #[tokio::test]
    async fn test_destroy_in_dependency_order() {
        let p = provisioner(RecordingManager::default());
        p.destroy_vm("rg", "web").await.unwrap();

        assert_eq!(
            p.manager().calls(),
            vec![
                "get_vm web",
                "delete_vm web",
                "get_nic web-nic0",
                "delete_nic web-nic0",
                "delete_public_ip web-pip0",
                "delete_disk web-osdisk",
            ]
        );
    }
}
