//! Area handlers.
//!
//! - `POST /v1/areas` - Create an area
//! - `GET /v1/areas/{name}/users` - List users registered in an area

use crate::errors::DirectoryError;
use crate::models::{NameResponse, UsersResponse};
use crate::routes::AppState;
use crate::services::area_service;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::instrument;

/// Handler for POST /v1/areas
#[instrument(
    skip_all,
    name = "directory.handlers.create_area",
    fields(method = "POST", endpoint = "/v1/areas")
)]
pub async fn create_area(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<NameResponse>), DirectoryError> {
    let name =
        area_service::create_area(state.store.as_ref(), state.config.area_name_length).await?;

    Ok((StatusCode::CREATED, Json(NameResponse { name })))
}

/// Handler for GET /v1/areas/{name}/users
#[instrument(
    skip_all,
    name = "directory.handlers.list_users",
    fields(method = "GET", endpoint = "/v1/areas/{name}/users")
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<UsersResponse>, DirectoryError> {
    let users = area_service::list_users(state.store.as_ref(), &name).await?;

    Ok(Json(UsersResponse { users }))
}
