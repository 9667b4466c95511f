//! Azure Resource Manager VM provisioning.
//!
//! Two layers:
//!
//! - **Request builder** ([`builder`]) - turns flat, form-like request
//!   fields into ARM payloads for VMs, NICs, public IPs and the custom
//!   script extension. Pure, no I/O.
//! - **Provider gateway** ([`gateway`]) - one method per remote operation
//!   against the ARM REST API, authenticated with a service principal.
//!
//! [`Provisioner`] sequences the two: public IPs and NICs first, then the
//! VM, then the extension.

#![allow(clippy::module_name_repetitions)]

pub mod builder;
pub mod config;
pub mod gateway;
pub mod models;
pub mod provision;
pub mod request;
pub mod ssh;

pub use config::{ArmEndpoints, AzureCredentials};
pub use gateway::{AzureError, AzureGateway, ResourceManager};
pub use provision::{ProvisionedVm, Provisioner};
pub use request::{ExtensionSpec, NetworkInterfaceSpec, ProvisionRequest};
pub use ssh::KeyPair;
