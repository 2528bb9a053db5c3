//! Request and response bodies for the directory RPC surface.

use serde::{Deserialize, Serialize};

/// Body of `POST /v1/users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddUserRequest {
    pub area: String,
}

/// A single generated name (area or user).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameResponse {
    pub name: String,
}

/// Users registered in an area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsersResponse {
    pub users: Vec<String>,
}

/// Readiness check body.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
