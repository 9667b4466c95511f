//! Image reference from a locator string.

use crate::gateway::AzureError;
use crate::models::ImageReference;

/// Build an image reference.
///
/// A locator starting with `/` is a managed image resource ID and is used
/// verbatim. Anything else must be a marketplace URN with exactly four
/// non-empty fields, `publisher:offer:sku:version`.
///
/// # Errors
/// Returns [`AzureError::InvalidImageReference`] for a malformed URN.
pub fn build_image_reference(locator: &str) -> Result<ImageReference, AzureError> {
    if locator.starts_with('/') {
        return Ok(ImageReference {
            id: Some(locator.to_string()),
            ..ImageReference::default()
        });
    }

    let fields: Vec<&str> = locator.split(':').collect();
    let [publisher, offer, sku, version] = fields.as_slice() else {
        return Err(AzureError::InvalidImageReference(locator.to_string()));
    };
    if fields.iter().any(|f| f.trim().is_empty()) {
        return Err(AzureError::InvalidImageReference(locator.to_string()));
    }

    Ok(ImageReference {
        publisher: Some((*publisher).to_string()),
        offer: Some((*offer).to_string()),
        sku: Some((*sku).to_string()),
        version: Some((*version).to_string()),
        id: None,
    })
}
