//! OS profile: admin account, SSH keys, custom data.

use base64::Engine;

use crate::models::{LinuxConfiguration, OsProfile, SshConfiguration, SshPublicKey};
use crate::request::ProvisionRequest;
use crate::ssh::KeyPair;

/// Where Azure writes authorized keys for a user.
#[must_use]
pub fn authorized_keys_path(username: &str) -> String {
    format!("/home/{username}/.ssh/authorized_keys")
}

/// OS profile for a request.
///
/// The local key pair's public key is always authorized. A caller-supplied
/// key is appended after it.
#[must_use]
pub fn build_os_profile(request: &ProvisionRequest, key_pair: &KeyPair) -> OsProfile {
    let path = authorized_keys_path(&request.username);

    let mut public_keys = vec![SshPublicKey {
        path: path.clone(),
        key_data: key_pair.public().to_string(),
    }];
    if let Some(extra) = request
        .ssh_key_data
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
    {
        public_keys.push(SshPublicKey {
            path,
            key_data: extra.to_string(),
        });
    }

    OsProfile {
        computer_name: request.name.clone(),
        admin_username: request.username.clone(),
        admin_password: request.password.clone(),
        linux_configuration: Some(LinuxConfiguration {
            disable_password_authentication: request.disable_password_authentication,
            ssh: Some(SshConfiguration { public_keys }),
        }),
        custom_data: request
            .custom_data
            .as_ref()
            .map(|data| base64::engine::general_purpose::STANDARD.encode(data)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ProvisionRequest {
        ProvisionRequest {
            name: "web-1".to_string(),
            username: "deploy".to_string(),
            password: Some("S3cret!pass".to_string()),
            ..ProvisionRequest::default()
        }
    }

    fn local_key() -> KeyPair {
        KeyPair::new("ssh-rsa AAAAlocal provisioner").unwrap()
    }

    #[test]
    fn test_local_key_always_injected() {
        let profile = build_os_profile(&request(), &local_key());
        let linux = profile.linux_configuration.unwrap();
        let keys = linux.ssh.unwrap().public_keys;

        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].key_data, "ssh-rsa AAAAlocal provisioner");
        assert_eq!(keys[0].path, "/home/deploy/.ssh/authorized_keys");
        assert!(!linux.disable_password_authentication);
        assert_eq!(profile.computer_name, "web-1");
        assert_eq!(profile.admin_password.as_deref(), Some("S3cret!pass"));
    }

    #[test]
    fn test_caller_key_appended() {
        let mut req = request();
        req.ssh_key_data = Some("ssh-ed25519 AAAAcaller me@laptop".to_string());
        req.disable_password_authentication = true;

        let linux = build_os_profile(&req, &local_key()).linux_configuration.unwrap();
        let keys = linux.ssh.unwrap().public_keys;

        assert!(linux.disable_password_authentication);
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[1].key_data, "ssh-ed25519 AAAAcaller me@laptop");
        assert_eq!(keys[1].path, keys[0].path);
    }

    #[test]
    fn test_custom_data_is_base64() {
        let mut req = request();
        assert_eq!(build_os_profile(&req, &local_key()).custom_data, None);

        req.custom_data = Some("#cloud-config\n".to_string());
        let profile = build_os_profile(&req, &local_key());
        assert_eq!(profile.custom_data.as_deref(), Some("I2Nsb3VkLWNvbmZpZwo="));
    }
}
