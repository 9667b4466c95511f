//! Locally held SSH key pair injected into every created VM.

use std::path::Path;

use crate::gateway::AzureError;

/// SSH key pair whose public half is authorized on new VMs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    public: String,
}

impl KeyPair {
    /// Wrap public key material (`ssh-rsa AAAA... comment`).
    ///
    /// # Errors
    /// Returns [`AzureError::Config`] if the key is blank.
    pub fn new(public: impl Into<String>) -> Result<Self, AzureError> {
        let public = public.into().trim().to_string();
        if public.is_empty() {
            return Err(AzureError::Config("SSH public key is empty".to_string()));
        }
        Ok(Self { public })
    }

    /// Load the public key from an OpenSSH `.pub` file.
    ///
    /// # Errors
    /// Returns [`AzureError::Config`] if the file cannot be read or is empty.
    pub fn from_public_key_file(path: impl AsRef<Path>) -> Result<Self, AzureError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AzureError::Config(format!(
                "Failed to read SSH public key {}: {e}",
                path.display()
            ))
        })?;
        Self::new(contents)
    }

    /// Public key material.
    #[must_use]
    pub fn public(&self) -> &str {
        &self.public
    }
}
