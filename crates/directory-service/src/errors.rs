use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Invalid name: {0}")]
    Validation(String),

    #[error("Area not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DirectoryError {
    /// Stable error code carried in the response body.
    pub fn error_code(&self) -> &'static str {
        match self {
            DirectoryError::Validation(_) => "VALIDATION_ERROR",
            DirectoryError::NotFound(_) => "NOT_FOUND",
            DirectoryError::Storage(_) => "STORAGE_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            DirectoryError::Validation(_) => StatusCode::BAD_REQUEST,
            DirectoryError::NotFound(_) => StatusCode::NOT_FOUND,
            DirectoryError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for DirectoryError {
    fn into_response(self) -> Response {
        let message = match &self {
            DirectoryError::Validation(reason) => reason.clone(),
            DirectoryError::NotFound(_) => "Area not found".to_string(),
            DirectoryError::Storage(detail) => {
                tracing::error!(target: "directory.errors", error = %detail, "Storage failure");
                "Directory storage unavailable".to_string()
            }
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message,
            },
        };

        (self.status_code(), Json(error_response)).into_response()
    }
}
