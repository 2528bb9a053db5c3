use hub_service::actors::{HubActor, HubSettings};
use hub_service::config::Config;
use hub_service::gateway::{self, GatewayState, HttpDirectoryClient};
use hub_service::observability::metrics::init_metrics_recorder;
use hub_service::observability::HealthState;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long to wait for the hub to disconnect everyone on shutdown.
const HUB_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hub_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Hub Service");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        directory_url = %config.directory_url,
        liveness_timeout_seconds = config.liveness_timeout.as_secs(),
        max_payload_bytes = config.max_payload_bytes,
        "Configuration loaded successfully"
    );

    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics: {}", e);
        e
    })?;

    let directory = HttpDirectoryClient::new(&config.directory_url, config.directory_timeout)
        .map_err(|e| {
            error!("Failed to create directory client: {}", e);
            e
        })?;

    let (hub, hub_task) = HubActor::spawn(HubSettings {
        max_consecutive_drops: config.max_consecutive_drops,
    });

    let health = Arc::new(HealthState::new());
    let state = Arc::new(GatewayState {
        hub: hub.clone(),
        directory: Arc::new(directory),
        connection_settings: config.connection_settings(),
        allowed_origins: config.allowed_origins.clone(),
    });

    let app = gateway::build_routes(state, Arc::clone(&health), metrics_handle);

    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind to address: {}", e);
        e
    })?;

    health.set_ready();
    info!("Hub Service listening on {}", addr);

    let shutdown_health = Arc::clone(&health);
    let shutdown_hub = hub.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            shutdown_health.set_not_ready();
            // Open sockets would otherwise hold graceful shutdown forever
            shutdown_hub.shutdown();
        })
        .await
        .map_err(|e| {
            error!("Server error: {}", e);
            e
        })?;

    hub.shutdown();
    if tokio::time::timeout(HUB_SHUTDOWN_TIMEOUT, hub_task).await.is_err() {
        warn!("Hub did not stop within {:?}", HUB_SHUTDOWN_TIMEOUT);
    }

    info!("Hub Service shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        () = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
