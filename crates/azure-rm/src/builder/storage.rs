//! OS disk and storage profile.

use crate::models::{
    CachingType, DiskCreateOption, ManagedDiskParameters, OsDisk, OsPlatform, StorageAccountType,
    StorageProfile,
};

/// Name of a VM's OS disk.
#[must_use]
pub fn os_disk_name(vm_name: &str) -> String {
    format!("{vm_name}-osdisk")
}

/// Resolve the OS disk caching mode.
///
/// Unset or unrecognized values fall back to `ReadWrite`, the recommended
/// mode for OS disks.
#[must_use]
pub fn caching_type(os_disk_caching: Option<&str>) -> CachingType {
    match os_disk_caching {
        Some("None") => CachingType::None,
        Some("ReadOnly") => CachingType::ReadOnly,
        _ => CachingType::ReadWrite,
    }
}

/// Resolve the disk tier. Only the literal `"true"` selects Premium.
#[must_use]
pub fn storage_account_type(premium_os_disk: Option<&str>) -> StorageAccountType {
    if premium_os_disk == Some("true") {
        StorageAccountType::PremiumLrs
    } else {
        StorageAccountType::StandardLrs
    }
}

/// Storage profile with a managed OS disk created from the image.
///
/// The image reference is filled in separately.
#[must_use]
pub fn build_storage_profile(
    vm_name: &str,
    os_disk_caching: Option<&str>,
    platform: OsPlatform,
    premium_os_disk: Option<&str>,
) -> StorageProfile {
    StorageProfile {
        image_reference: None,
        os_disk: Some(OsDisk {
            name: Some(os_disk_name(vm_name)),
            os_type: Some(platform),
            create_option: DiskCreateOption::FromImage,
            caching: Some(caching_type(os_disk_caching)),
            managed_disk: Some(ManagedDiskParameters {
                storage_account_type: storage_account_type(premium_os_disk),
                id: None,
            }),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caching_resolution() {
        let cases = [
            (None, CachingType::ReadWrite),
            (Some("None"), CachingType::None),
            (Some("ReadOnly"), CachingType::ReadOnly),
            (Some("ReadWrite"), CachingType::ReadWrite),
            (Some("WriteBack"), CachingType::ReadWrite),
        ];
        for (input, expected) in cases {
            assert_eq!(caching_type(input), expected, "input {input:?}");
        }
    }

    #[test]
    fn test_premium_is_literal_match() {
        assert_eq!(storage_account_type(Some("true")), StorageAccountType::PremiumLrs);
        for other in [Some("false"), Some(""), Some("True"), Some("1"), None] {
            assert_eq!(storage_account_type(other), StorageAccountType::StandardLrs);
        }
    }

    #[test]
    fn test_storage_profile_shape() {
        let profile = build_storage_profile("db-1", Some("ReadOnly"), OsPlatform::Linux, Some("true"));
        let json = serde_json::to_value(&profile).unwrap();

        assert_eq!(json["osDisk"]["name"], "db-1-osdisk");
        assert_eq!(json["osDisk"]["createOption"], "FromImage");
        assert_eq!(json["osDisk"]["osType"], "Linux");
        assert_eq!(json["osDisk"]["caching"], "ReadOnly");
        assert_eq!(json["osDisk"]["managedDisk"]["storageAccountType"], "Premium_LRS");
        assert!(json.get("imageReference").is_none());
    }
}
