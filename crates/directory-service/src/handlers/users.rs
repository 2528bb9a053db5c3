//! User handlers.
//!
//! - `POST /v1/users` - Register a new user in an existing area

use crate::errors::DirectoryError;
use crate::models::{AddUserRequest, NameResponse};
use crate::routes::AppState;
use crate::services::user_service;
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use tracing::instrument;

/// Handler for POST /v1/users
///
/// The body is parsed by hand so malformed JSON maps to 400 rather than
/// axum's default 422.
#[instrument(
    skip_all,
    name = "directory.handlers.add_user",
    fields(method = "POST", endpoint = "/v1/users")
)]
pub async fn add_user(
    State(state): State<Arc<AppState>>,
    body: axum::body::Bytes,
) -> Result<(StatusCode, Json<NameResponse>), DirectoryError> {
    let request: AddUserRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!(target: "directory.handlers.users", error = %e, "Invalid request body");
        DirectoryError::Validation("Invalid request body".to_string())
    })?;

    let name = user_service::add_user(
        state.store.as_ref(),
        state.config.user_name_length,
        &request.area,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(NameResponse { name })))
}
