//! Directory Service HTTP client.
//!
//! The gateway forwards area and user requests to the directory service and
//! maps its status codes back to `GatewayError`.
//!
//! # Status mapping
//!
//! | Directory response     | Gateway error  |
//! |------------------------|----------------|
//! | 400                    | `Validation`   |
//! | 404                    | `NotFound`     |
//! | 503 `STORAGE_ERROR`    | `Storage`      |
//! | other error / no reply | `Unavailable`  |
//!
//! Area names are checked with `is_name_safe` before any request is made, so
//! dot segments and separators never reach the URL.

use crate::errors::GatewayError;
use async_trait::async_trait;
use common::naming::is_name_safe;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, instrument, warn};

/// Connect timeout for directory requests in seconds.
const DIRECTORY_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Directory operations the gateway needs.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Create an area and return its generated name.
    async fn create_area(&self) -> Result<String, GatewayError>;

    /// List the users registered in `area`.
    async fn list_users(&self, area: &str) -> Result<Vec<String>, GatewayError>;

    /// Register a new user in `area` and return its generated name.
    async fn add_user(&self, area: &str) -> Result<String, GatewayError>;
}

#[derive(Debug, Serialize)]
struct AddUserRequest<'a> {
    area: &'a str,
}

#[derive(Debug, Deserialize)]
struct NameResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct UsersResponse {
    users: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// HTTP client for the directory service.
#[derive(Clone)]
pub struct HttpDirectoryClient {
    /// HTTP client with configured timeouts.
    client: Client,

    /// Base URL of the directory service.
    base_url: Url,
}

impl HttpDirectoryClient {
    /// Create a new directory client.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Unavailable` if the base URL is invalid or the
    /// HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            error!(target: "hub.gateway.directory", error = %e, "Invalid directory URL");
            GatewayError::Unavailable(format!("invalid directory URL: {e}"))
        })?;

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(DIRECTORY_CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                error!(target: "hub.gateway.directory", error = %e, "Failed to build HTTP client");
                GatewayError::Unavailable(format!("HTTP client build failed: {e}"))
            })?;

        Ok(Self { client, base_url })
    }

    /// Append path segments to the base URL, escaping each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| GatewayError::Unavailable("directory URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, GatewayError> {
        let response = request.send().await.map_err(|e| {
            warn!(target: "hub.gateway.directory", error = %e, "Directory request failed");
            GatewayError::Unavailable(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body: ErrorBody = response.json().await.unwrap_or_default();
        Err(map_error_status(status, body.error))
    }
}

fn validate_area(area: &str) -> Result<(), GatewayError> {
    if !is_name_safe(area) {
        return Err(GatewayError::Validation("Invalid area name".to_string()));
    }
    Ok(())
}

fn map_error_status(status: StatusCode, detail: ErrorDetail) -> GatewayError {
    match status {
        StatusCode::BAD_REQUEST => {
            let message = if detail.message.is_empty() {
                "Invalid request".to_string()
            } else {
                detail.message
            };
            GatewayError::Validation(message)
        }
        StatusCode::NOT_FOUND => GatewayError::NotFound(detail.message),
        StatusCode::SERVICE_UNAVAILABLE if detail.code == "STORAGE_ERROR" => {
            GatewayError::Storage(detail.message)
        }
        _ => {
            warn!(target: "hub.gateway.directory", status = %status, "Unexpected directory response");
            GatewayError::Unavailable(format!("directory returned {status}"))
        }
    }
}

async fn parse<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T, GatewayError> {
    response.json().await.map_err(|e| {
        error!(target: "hub.gateway.directory", error = %e, "Failed to parse directory response");
        GatewayError::Unavailable(format!("malformed directory response: {e}"))
    })
}

#[async_trait]
impl DirectoryClient for HttpDirectoryClient {
    #[instrument(skip_all, name = "hub.gateway.directory.create_area")]
    async fn create_area(&self) -> Result<String, GatewayError> {
        let url = self.endpoint(&["v1", "areas"])?;
        let response = self.send(self.client.post(url)).await?;
        let body: NameResponse = parse(response).await?;
        Ok(body.name)
    }

    #[instrument(skip_all, name = "hub.gateway.directory.list_users", fields(area = %area))]
    async fn list_users(&self, area: &str) -> Result<Vec<String>, GatewayError> {
        validate_area(area)?;
        let url = self.endpoint(&["v1", "areas", area, "users"])?;
        let response = self.send(self.client.get(url)).await?;
        let body: UsersResponse = parse(response).await?;
        Ok(body.users)
    }

    #[instrument(skip_all, name = "hub.gateway.directory.add_user", fields(area = %area))]
    async fn add_user(&self, area: &str) -> Result<String, GatewayError> {
        validate_area(area)?;
        let url = self.endpoint(&["v1", "users"])?;
        let response = self
            .send(self.client.post(url).json(&AddUserRequest { area }))
            .await?;
        let body: NameResponse = parse(response).await?;
        Ok(body.name)
    }
}
