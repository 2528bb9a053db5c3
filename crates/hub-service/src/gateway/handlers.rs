//! Gateway HTTP handlers.
//!
//! Area and user operations are forwarded to the directory service. Create
//! and join answer with the generated name as plain text.

use crate::errors::GatewayError;
use crate::gateway::routes::GatewayState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// Users of an area, as stored by the directory or currently online.
#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<String>,
}

/// `POST /areas` - create an area, returns its name.
#[instrument(skip_all, name = "hub.gateway.create_area")]
pub async fn create_area(
    State(state): State<Arc<GatewayState>>,
) -> Result<(StatusCode, String), GatewayError> {
    let name = state.directory.create_area().await?;
    info!(target: "hub.gateway", area = %name, "Area created");
    Ok((StatusCode::CREATED, name))
}

/// `POST /join` - register a user in the area named by the body.
#[instrument(skip_all, name = "hub.gateway.join")]
pub async fn join(
    State(state): State<Arc<GatewayState>>,
    body: String,
) -> Result<(StatusCode, String), GatewayError> {
    let area = body.trim();
    if area.is_empty() {
        return Err(GatewayError::Validation("Area name is required".to_string()));
    }

    let user = state.directory.add_user(area).await?;
    info!(target: "hub.gateway", area = %area, user = %user, "User joined");
    Ok((StatusCode::CREATED, user))
}

/// `GET /areas/:name/users` - users registered in the directory.
#[instrument(skip_all, name = "hub.gateway.list_users", fields(area = %name))]
pub async fn list_users(
    State(state): State<Arc<GatewayState>>,
    Path(name): Path<String>,
) -> Result<Json<UsersResponse>, GatewayError> {
    let users = state.directory.list_users(&name).await?;
    Ok(Json(UsersResponse { users }))
}

/// `GET /areas/:name/online` - users currently connected to the hub.
///
/// An area nobody is connected to answers with an empty list.
#[instrument(skip_all, name = "hub.gateway.online_users", fields(area = %name))]
pub async fn online_users(
    State(state): State<Arc<GatewayState>>,
    Path(name): Path<String>,
) -> Result<Json<UsersResponse>, GatewayError> {
    let users = state
        .hub
        .online_users(name)
        .await
        .map_err(|e| GatewayError::HubUnavailable(e.to_string()))?;
    Ok(Json(UsersResponse { users }))
}
