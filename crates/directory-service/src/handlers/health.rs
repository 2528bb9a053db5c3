//! Health check handlers.
//!
//! - `/health`: Liveness check - returns OK if the process is running
//! - `/ready`: Readiness check - checks the storage root is reachable

use crate::models::ReadinessResponse;
use crate::routes::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

/// Liveness check handler. Does not check dependencies.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness check handler.
///
/// Returns 200 if the storage root is an accessible directory, 503 otherwise.
/// The error message is generic; the cause is logged.
#[tracing::instrument(skip_all, name = "directory.health.readiness")]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match tokio::fs::metadata(&state.config.storage_root).await {
        Ok(meta) if meta.is_dir() => (
            StatusCode::OK,
            Json(ReadinessResponse {
                status: "ready",
                storage: Some("healthy"),
                error: None,
            }),
        ),
        Ok(_) => {
            tracing::warn!("Readiness check failed: storage root is not a directory");
            not_ready()
        }
        Err(e) => {
            tracing::warn!("Readiness check failed: storage root error: {}", e);
            not_ready()
        }
    }
}

fn not_ready() -> (StatusCode, Json<ReadinessResponse>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ReadinessResponse {
            status: "not_ready",
            storage: Some("unhealthy"),
            error: Some("Service dependencies unavailable".to_string()),
        }),
    )
}
