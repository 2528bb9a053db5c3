//! HTTP routes for Directory Service.
//!
//! Defines the Axum router and application state.

use crate::config::Config;
use crate::handlers;
use crate::repositories::AreaStore;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Area storage backend.
    pub store: Arc<dyn AreaStore>,

    /// Service configuration.
    pub config: Config,
}

/// Build the application routes.
///
/// - `/health`, `/ready` - health checks
/// - `POST /v1/areas` - CreateArea
/// - `GET /v1/areas/:name/users` - ListUsers
/// - `POST /v1/users` - AddUser
/// - TraceLayer for request logging
/// - 30 second request timeout
pub fn build_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/v1/areas", post(handlers::create_area))
        .route("/v1/areas/:name/users", get(handlers::list_users))
        .route("/v1/users", post(handlers::add_user))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::repositories::FsAreaStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::collections::HashMap;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_app(root: &std::path::Path) -> Router {
        let vars = HashMap::from([(
            "DIRECTORY_STORAGE_ROOT".to_string(),
            root.display().to_string(),
        )]);
        let config = Config::from_vars(&vars).unwrap();
        let state = Arc::new(AppState {
            store: Arc::new(FsAreaStore::new(root)),
            config,
        });
        build_routes(state)
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[tokio::test]
    async fn test_health_returns_ok() {
        let dir = TempDir::new().unwrap();
        let response = test_app(dir.path())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ready_with_missing_root_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone");
        let response = test_app(&missing)
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_create_area_returns_created_name() {
        let dir = TempDir::new().unwrap();
        let response = test_app(dir.path())
            .oneshot(Request::post("/v1/areas").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        let name = body["name"].as_str().unwrap();
        assert_eq!(name.len(), 10);
        assert!(dir.path().join(name).is_dir());
    }

    #[tokio::test]
    async fn test_list_users_unknown_area_is_404() {
        let dir = TempDir::new().unwrap();
        let response = test_app(dir.path())
            .oneshot(
                Request::get("/v1/areas/missing/users")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_list_users_unsafe_name_is_400() {
        let dir = TempDir::new().unwrap();
        let response = test_app(dir.path())
            .oneshot(
                Request::get("/v1/areas/..%2Fetc/users")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["error"]["code"],
            "VALIDATION_ERROR"
        );
    }

    #[tokio::test]
    async fn test_add_user_malformed_body_is_400() {
        let dir = TempDir::new().unwrap();
        let response = test_app(dir.path())
            .oneshot(
                Request::post("/v1/users")
                    .header("content-type", "application/json")
                    .body(Body::from("not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
