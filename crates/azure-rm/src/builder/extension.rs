//! Custom script extension payload.

use crate::models::{
    CustomScriptSettings, OsPlatform, VirtualMachineExtension, VirtualMachineExtensionProperties,
};
use crate::request::ExtensionSpec;

/// Name the custom script extension is registered under. A VM has at most
/// one.
pub const CUSTOM_SCRIPT_EXTENSION_NAME: &str = "ProvisionCustomScript";

/// Publisher, handler type and handler version for a platform.
#[must_use]
pub fn custom_script_handler(platform: OsPlatform) -> (&'static str, &'static str, &'static str) {
    match platform {
        OsPlatform::Linux => ("Microsoft.Azure.Extensions", "CustomScript", "2.0"),
        OsPlatform::Windows => ("Microsoft.Compute", "CustomScriptExtension", "1.10"),
    }
}

/// Split a comma-separated URI list, dropping blanks.
fn split_uris(uris: Option<&str>) -> Vec<String> {
    uris.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|uri| !uri.is_empty())
        .map(str::to_string)
        .collect()
}

/// Custom script extension, or `None` when there is nothing to run.
#[must_use]
pub fn build_extension(region: &str, spec: &ExtensionSpec) -> Option<VirtualMachineExtension> {
    if !spec.is_present() {
        return None;
    }

    let (publisher, handler, version) = custom_script_handler(spec.platform);

    Some(VirtualMachineExtension {
        id: None,
        name: None,
        location: region.to_string(),
        properties: VirtualMachineExtensionProperties {
            publisher: Some(publisher.to_string()),
            extension_type: Some(handler.to_string()),
            type_handler_version: Some(version.to_string()),
            auto_upgrade_minor_version: true,
            settings: Some(CustomScriptSettings {
                command_to_execute: spec
                    .script_command
                    .clone()
                    .filter(|c| !c.trim().is_empty()),
                file_uris: split_uris(spec.script_uris.as_deref()),
            }),
            provisioning_state: None,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_to_run() {
        assert!(build_extension("eastus", &ExtensionSpec::default()).is_none());

        let blank = ExtensionSpec {
            script_command: Some("  ".to_string()),
            script_uris: Some(String::new()),
            platform: OsPlatform::Linux,
        };
        assert!(build_extension("eastus", &blank).is_none());
    }

    #[test]
    fn test_command_with_empty_uri_list() {
        let spec = ExtensionSpec {
            script_command: Some("sh setup.sh".to_string()),
            script_uris: None,
            platform: OsPlatform::Linux,
        };
        let extension = build_extension("westeurope", &spec).unwrap();
        let json = serde_json::to_value(&extension).unwrap();

        assert_eq!(json["location"], "westeurope");
        assert_eq!(json["properties"]["publisher"], "Microsoft.Azure.Extensions");
        assert_eq!(json["properties"]["type"], "CustomScript");
        assert_eq!(json["properties"]["typeHandlerVersion"], "2.0");
        assert_eq!(json["properties"]["autoUpgradeMinorVersion"], true);
        assert_eq!(json["properties"]["settings"]["commandToExecute"], "sh setup.sh");
        assert_eq!(json["properties"]["settings"]["fileUris"], serde_json::json!([]));
    }

    #[test]
    fn test_uris_split_on_commas() {
        let spec = ExtensionSpec {
            script_command: None,
            script_uris: Some("https://x/a.sh, https://x/b.sh,".to_string()),
            platform: OsPlatform::Windows,
        };
        let extension = build_extension("eastus", &spec).unwrap();
        let props = extension.properties;
        let settings = props.settings.unwrap();

        assert_eq!(settings.file_uris, vec!["https://x/a.sh", "https://x/b.sh"]);
        assert_eq!(settings.command_to_execute, None);
        assert_eq!(props.publisher.as_deref(), Some("Microsoft.Compute"));
        assert_eq!(props.extension_type.as_deref(), Some("CustomScriptExtension"));
    }
}
