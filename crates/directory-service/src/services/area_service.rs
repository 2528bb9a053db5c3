//! Area directory: creates areas and lists their registered users.

use crate::errors::DirectoryError;
use crate::repositories::AreaStore;
use crate::services::{generate_name, validate_area_name};
use std::io;
use tracing::instrument;

/// Create a new area with a random name of `name_length` characters.
///
/// No collision check is made against existing areas; a collision would
/// merge two areas, so deployments size `name_length` accordingly.
#[instrument(skip_all, name = "directory.area.create")]
pub async fn create_area(
    store: &dyn AreaStore,
    name_length: usize,
) -> Result<String, DirectoryError> {
    let name = generate_name(name_length)?;

    store.create_area_dir(&name).await.map_err(|e| {
        tracing::error!(target: "directory.services.area", error = %e, "Failed to create area directory");
        DirectoryError::Storage(e.to_string())
    })?;

    tracing::info!(target: "directory.services.area", area = %name, "Area created");
    Ok(name)
}

/// List the users registered in `area`.
///
/// The name is validated before any storage access. Order is unspecified.
#[instrument(skip_all, name = "directory.area.list_users")]
pub async fn list_users(store: &dyn AreaStore, area: &str) -> Result<Vec<String>, DirectoryError> {
    validate_area_name(area)?;

    match store.list_members(area).await {
        Ok(users) => Ok(users),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(target: "directory.services.area", area = %area, "Area not found");
            Err(DirectoryError::NotFound(area.to_string()))
        }
        Err(e) => {
            tracing::error!(target: "directory.services.area", area = %area, error = %e, "Failed to list area members");
            Err(DirectoryError::Storage(e.to_string()))
        }
    }
}
