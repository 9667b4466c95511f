//! azure-rm CLI - provision and manage Azure VMs.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use azure_rm::config::{DEFAULT_AUTHORITY_URL, DEFAULT_MANAGEMENT_URL};
use azure_rm::provision::destroy_vm;
use azure_rm::{
    ArmEndpoints, AzureCredentials, AzureError, AzureGateway, KeyPair, ProvisionRequest,
    Provisioner, ResourceManager,
};

/// azure-rm CLI - Azure VM provisioning.
#[derive(Parser)]
#[command(name = "azure-rm")]
#[command(about = "Provision and manage Azure virtual machines")]
struct Cli {
    /// Directory (tenant) ID (or set `AZURE_TENANT_ID` env var).
    #[arg(long, env = "AZURE_TENANT_ID")]
    tenant_id: String,

    /// Application (client) ID (or set `AZURE_CLIENT_ID` env var).
    #[arg(long, env = "AZURE_CLIENT_ID")]
    client_id: String,

    /// Client secret (or set `AZURE_CLIENT_SECRET` env var).
    #[arg(long, env = "AZURE_CLIENT_SECRET", hide_env_values = true)]
    client_secret: String,

    /// Subscription ID (or set `AZURE_SUBSCRIPTION_ID` env var).
    #[arg(long, env = "AZURE_SUBSCRIPTION_ID")]
    subscription_id: String,

    /// Resource Manager endpoint.
    #[arg(long, env = "AZURE_MANAGEMENT_URL", default_value = DEFAULT_MANAGEMENT_URL)]
    management_url: String,

    /// Entra ID authority.
    #[arg(long, env = "AZURE_AUTHORITY_URL", default_value = DEFAULT_AUTHORITY_URL)]
    authority_url: String,

    /// Enable verbose logging.
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List resource groups in the subscription.
    ResourceGroups,

    /// List VM sizes available in a region.
    VmSizes {
        /// Region, display name or short name (e.g., "East US 2", eastus2).
        #[arg(long)]
        region: String,
    },

    /// List VMs in a region.
    Vms {
        /// Region short name (e.g., eastus).
        #[arg(long)]
        region: String,
    },

    /// Show the power state of a VM.
    Status {
        /// Resource group.
        #[arg(long)]
        resource_group: String,

        /// VM name.
        #[arg(long)]
        name: String,
    },

    /// Start a VM.
    Start {
        /// Resource group.
        #[arg(long)]
        resource_group: String,

        /// VM name.
        #[arg(long)]
        name: String,
    },

    /// Power off and deallocate a VM.
    Stop {
        /// Resource group.
        #[arg(long)]
        resource_group: String,

        /// VM name.
        #[arg(long)]
        name: String,
    },

    /// Create a VM from a YAML or JSON definition.
    Create {
        /// Path to the VM definition.
        #[arg(long)]
        definition: PathBuf,

        /// Public key authorized on every VM (or set `AZURE_SSH_PUBLIC_KEY`).
        #[arg(long, env = "AZURE_SSH_PUBLIC_KEY")]
        ssh_public_key: PathBuf,
    },

    /// Delete a VM with its NICs, public IPs and OS disk.
    Destroy {
        /// Resource group.
        #[arg(long)]
        resource_group: String,

        /// VM name.
        #[arg(long)]
        name: String,
    },
}

/// Load a VM definition. `.json` files are parsed as JSON, anything else
/// as YAML.
fn load_definition(path: &Path) -> Result<ProvisionRequest> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read definition {}", path.display()))?;

    let request = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&raw).context("Failed to parse JSON definition")?
    } else {
        serde_yaml::from_str(&raw).context("Failed to parse YAML definition")?
    };
    Ok(request)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let credentials = AzureCredentials::new(
        cli.tenant_id,
        cli.client_id,
        cli.client_secret,
        cli.subscription_id,
    );
    let endpoints = ArmEndpoints::custom(&cli.management_url, &cli.authority_url)
        .context("Invalid endpoint URL")?;
    let gateway =
        AzureGateway::with_endpoints(credentials, endpoints).context("Failed to create Azure gateway")?;

    match cli.command {
        Commands::ResourceGroups => {
            let groups = gateway.list_resource_groups().await?;
            println!("\nRESOURCE GROUP");
            println!("{}", "-".repeat(40));
            for group in groups {
                println!("{group}");
            }
        }

        Commands::VmSizes { region } => {
            let sizes = gateway.list_vm_sizes(Some(&region)).await?;
            println!("\n{:<28} {:>6} {:>12}", "SIZE", "CORES", "MEMORY (MB)");
            println!("{}", "-".repeat(48));
            for size in sizes {
                println!(
                    "{:<28} {:>6} {:>12}",
                    size.name, size.number_of_cores, size.memory_in_mb
                );
            }
        }

        Commands::Vms { region } => {
            let vms = gateway.list_vms(&region).await?;
            println!("\n{:<30} {:<16} {:<12}", "NAME", "LOCATION", "STATE");
            println!("{}", "-".repeat(60));
            for vm in vms {
                println!(
                    "{:<30} {:<16} {:<12}",
                    vm.name.clone().unwrap_or_default(),
                    vm.location,
                    vm.properties.provisioning_state.unwrap_or_default()
                );
            }
        }

        Commands::Status {
            resource_group,
            name,
        } => {
            let state = gateway.check_vm_status(&resource_group, &name).await?;
            println!("{name}: {}", state.as_deref().unwrap_or("unknown"));
        }

        Commands::Start {
            resource_group,
            name,
        } => {
            gateway.start_vm(&resource_group, &name).await?;
            info!("Started {name}");
        }

        Commands::Stop {
            resource_group,
            name,
        } => {
            gateway.stop_vm(&resource_group, &name).await?;
            info!("Stopped and deallocated {name}");
        }

        Commands::Create {
            definition,
            ssh_public_key,
        } => {
            let request = load_definition(&definition)?;
            let key_pair = KeyPair::from_public_key_file(&ssh_public_key)?;
            let provisioner = Provisioner::new(gateway, key_pair);

            match provisioner.provision(&request).await {
                Ok(provisioned) => {
                    println!("\nVM created:");
                    println!("  Name:  {}", request.name);
                    println!("  ID:    {}", provisioned.vm.id.unwrap_or_default());
                    for nic in &provisioned.nics {
                        println!("  NIC:   {}", nic.name.clone().unwrap_or_default());
                    }
                    if let Some(extension) = provisioned.extension {
                        println!(
                            "  Script: {}",
                            extension.properties.provisioning_state.unwrap_or_default()
                        );
                    }
                }
                Err(AzureError::PartialProvision { created, source }) => {
                    eprintln!("\nProvisioning failed; these resources were left behind:");
                    for id in &created {
                        eprintln!("  {id}");
                    }
                    bail!("Provisioning {} failed: {source}", request.name);
                }
                Err(e) => return Err(e).context(format!("Provisioning {} failed", request.name)),
            }
        }

        Commands::Destroy {
            resource_group,
            name,
        } => {
            destroy_vm(&gateway, &resource_group, &name).await?;
            info!("Destroyed {name}");
        }
    }

    Ok(())
}
