//! Gateway HTTP tests against a stand-in directory service.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use hub_service::actors::{ConnectionSettings, HubActor, HubSettings};
use hub_service::gateway::{build_routes, GatewayState, HttpDirectoryClient};
use hub_service::observability::HealthState;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gateway_router(directory_url: &str) -> anyhow::Result<axum::Router> {
    let (hub, _hub_task) = HubActor::spawn(HubSettings {
        max_consecutive_drops: 64,
    });
    let directory = HttpDirectoryClient::new(directory_url, Duration::from_secs(2))?;
    let state = Arc::new(GatewayState {
        hub,
        directory: Arc::new(directory),
        connection_settings: ConnectionSettings {
            liveness_timeout: Duration::from_secs(60),
            write_timeout: Duration::from_secs(10),
            max_payload: 4096,
            outbound_capacity: 256,
        },
        allowed_origins: Vec::new(),
    });
    let health = Arc::new(HealthState::new());
    health.set_ready();
    let metrics = PrometheusBuilder::new().build_recorder().handle();
    Ok(build_routes(state, health, metrics))
}

struct TestGateway {
    addr: SocketAddr,
    client: reqwest::Client,
    _handle: tokio::task::JoinHandle<()>,
}

impl TestGateway {
    async fn spawn(directory_url: &str) -> anyhow::Result<Self> {
        let app = gateway_router(directory_url)?;
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Ok(Self {
            addr,
            client: reqwest::Client::new(),
            _handle: handle,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

#[tokio::test]
async fn test_create_area_and_join() -> anyhow::Result<()> {
    let directory = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/areas"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"name": "q8w7e6r5t4"})))
        .expect(1)
        .mount(&directory)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/users"))
        .and(body_json(json!({"area": "q8w7e6r5t4"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"name": "a1b2c3d4"})))
        .expect(1)
        .mount(&directory)
        .await;

    let gateway = TestGateway::spawn(&directory.uri()).await?;

    let response = gateway.client.post(gateway.url("/areas")).send().await?;
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let area = response.text().await?;
    assert_eq!(area, "q8w7e6r5t4");

    let response = gateway
        .client
        .post(gateway.url("/join"))
        .body(area)
        .send()
        .await?;
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    assert_eq!(response.text().await?, "a1b2c3d4");

    Ok(())
}

#[tokio::test]
async fn test_list_users_passes_through() -> anyhow::Result<()> {
    let directory = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/areas/q8w7e6r5t4/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"users": ["a1b2c3d4"]})))
        .mount(&directory)
        .await;

    let gateway = TestGateway::spawn(&directory.uri()).await?;

    let body: serde_json::Value = gateway
        .client
        .get(gateway.url("/areas/q8w7e6r5t4/users"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body, json!({"users": ["a1b2c3d4"]}));

    Ok(())
}

#[tokio::test]
async fn test_directory_not_found_is_not_found() -> anyhow::Result<()> {
    let directory = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/areas/missing0000/users"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": "NOT_FOUND", "message": "Area not found"}
        })))
        .mount(&directory)
        .await;

    let gateway = TestGateway::spawn(&directory.uri()).await?;

    let response = gateway
        .client
        .get(gateway.url("/areas/missing0000/users"))
        .send()
        .await?;
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_unreachable_directory_is_bad_gateway() -> anyhow::Result<()> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let closed_addr = listener.local_addr()?;
    drop(listener);

    let gateway = TestGateway::spawn(&format!("http://{closed_addr}")).await?;

    let response = gateway.client.post(gateway.url("/areas")).send().await?;
    assert_eq!(response.status(), reqwest::StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "DIRECTORY_UNAVAILABLE");

    Ok(())
}

#[tokio::test]
async fn test_metrics_endpoint_serves_text() -> anyhow::Result<()> {
    let gateway = TestGateway::spawn("http://127.0.0.1:9").await?;

    let response = gateway.client.get(gateway.url("/metrics")).send().await?;
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_dot_segment_area_is_validation_error() -> anyhow::Result<()> {
    let directory = MockServer::start().await;
    let app = gateway_router(&directory.uri())?;

    // Sent raw so no client-side URL normalization removes the dot segments
    for uri in ["/areas/%2E%2E/users", "/areas/%2E/users", "/areas/..%2Fetc/users"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");

        let bytes = response.into_body().collect().await?.to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes)?;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR", "{uri}");
    }

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/join")
                .body(Body::from(".."))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert!(directory.received_requests().await.unwrap_or_default().is_empty());
    Ok(())
}
