//! User directory: registers users in existing areas.

use crate::errors::DirectoryError;
use crate::repositories::AreaStore;
use crate::services::{generate_name, validate_area_name};
use std::io;
use tracing::instrument;

/// Attempts at generating an unused user name before giving up.
const MAX_NAME_COLLISION_RETRIES: usize = 3;

/// Register a new user with a random name in `area`.
///
/// The area name is validated before any storage access and the area must
/// already exist. A generated name that is already taken is retried.
#[instrument(skip_all, name = "directory.user.add")]
pub async fn add_user(
    store: &dyn AreaStore,
    name_length: usize,
    area: &str,
) -> Result<String, DirectoryError> {
    validate_area_name(area)?;

    let exists = store.area_exists(area).await.map_err(|e| {
        tracing::error!(target: "directory.services.user", area = %area, error = %e, "Failed to check area");
        DirectoryError::Storage(e.to_string())
    })?;

    if !exists {
        tracing::debug!(target: "directory.services.user", area = %area, "Area not found");
        return Err(DirectoryError::NotFound(area.to_string()));
    }

    for attempt in 1..=MAX_NAME_COLLISION_RETRIES {
        let user = generate_name(name_length)?;

        match store.create_member(area, &user).await {
            Ok(()) => {
                tracing::info!(target: "directory.services.user", area = %area, user = %user, "User added");
                return Ok(user);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                tracing::warn!(target: "directory.services.user", area = %area, attempt, "User name collision, retrying");
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                // Area removed between the existence check and the write
                return Err(DirectoryError::NotFound(area.to_string()));
            }
            Err(e) => {
                tracing::error!(target: "directory.services.user", area = %area, error = %e, "Failed to create member record");
                return Err(DirectoryError::Storage(e.to_string()));
            }
        }
    }

    tracing::error!(target: "directory.services.user", area = %area, "Exhausted user name retries");
    Err(DirectoryError::Storage(
        "could not allocate a unique user name".to_string(),
    ))
}
