//! HTTP routes for the Hub Service gateway.
//!
//! Defines the Axum router and gateway state.

use crate::actors::{ConnectionSettings, HubHandle};
use crate::gateway::directory_client::DirectoryClient;
use crate::gateway::{handlers, ws};
use crate::observability::{health_router, HealthState};
use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// State shared across gateway handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Handle to the hub actor.
    pub hub: HubHandle,

    /// Directory service client.
    pub directory: Arc<dyn DirectoryClient>,

    /// Settings applied to every new connection.
    pub connection_settings: ConnectionSettings,

    /// Origins allowed to open a WebSocket. Empty allows any origin.
    pub allowed_origins: Vec<String>,
}

/// Build the gateway routes.
///
/// - `/health`, `/ready` - health checks
/// - `/metrics` - Prometheus metrics
/// - `POST /areas` - create an area
/// - `POST /join` - register a user in an area
/// - `GET /areas/:name/users` - registered users
/// - `GET /areas/:name/online` - connected users
/// - `GET /ws` - WebSocket upgrade
/// - TraceLayer for request logging
/// - 30 second timeout on plain HTTP routes
pub fn build_routes(
    state: Arc<GatewayState>,
    health: Arc<HealthState>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let api_routes = Router::new()
        .route("/areas", post(handlers::create_area))
        .route("/join", post(handlers::join))
        .route("/areas/:name/users", get(handlers::list_users))
        .route("/areas/:name/online", get(handlers::online_users))
        .with_state(Arc::clone(&state))
        .layer(TimeoutLayer::new(Duration::from_secs(30)));

    let metrics_routes = Router::new().route(
        "/metrics",
        get(move || {
            let handle = metrics_handle.clone();
            async move { handle.render() }
        }),
    );

    // Upgraded sockets outlive the request, so no timeout layer here
    let ws_routes = Router::new()
        .route("/ws", get(ws::ws_handler))
        .with_state(state);

    api_routes
        .merge(health_router(health))
        .merge(metrics_routes)
        .merge(ws_routes)
        .layer(TraceLayer::new_for_http())
}
