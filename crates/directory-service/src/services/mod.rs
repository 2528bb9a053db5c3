//! Business logic for the area and user directories.

pub mod area_service;
pub mod user_service;

use crate::errors::DirectoryError;
use common::naming::{self, NamingError};

/// Generate a fresh identifier, mapping failures to a storage-class error.
pub(crate) fn generate_name(len: usize) -> Result<String, DirectoryError> {
    naming::random_identifier(len).map_err(|e: NamingError| {
        tracing::error!(target: "directory.services", error = %e, "Name generation failed");
        DirectoryError::Storage(format!("name generation failed: {e}"))
    })
}

/// Reject names that could escape the storage root.
pub(crate) fn validate_area_name(area: &str) -> Result<(), DirectoryError> {
    if naming::is_name_safe(area) {
        Ok(())
    } else {
        tracing::debug!(target: "directory.services", "Rejected unsafe area name");
        Err(DirectoryError::Validation("Invalid area name".to_string()))
    }
}
