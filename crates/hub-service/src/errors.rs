//! Hub Service error types.
//!
//! `HubError` covers the connection and hub actors; its variants double as
//! connection close reasons. `GatewayError` is returned by HTTP handlers and
//! maps to a status code and a stable error code. Internal details are
//! logged server-side but not exposed to clients.

use area_protocol::codec::CodecError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Connection and hub actor error type.
#[derive(Debug, Error)]
pub enum HubError {
    /// Malformed frame, wrong handshake tag, or oversized payload.
    #[error("Protocol error: {0}")]
    Protocol(#[from] CodecError),

    /// The underlying transport failed or sent something unusable.
    #[error("Transport error: {0}")]
    Transport(String),

    /// An outbound write did not complete within the write deadline.
    #[error("Write deadline exceeded")]
    WriteTimeout,

    /// No keep-alive reply arrived within the liveness timeout.
    #[error("Liveness timeout")]
    LivenessTimeout,

    /// Actor mailbox or reply channel failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HubError {
    /// Bounded label used for close-reason metrics.
    #[must_use]
    pub fn close_reason(&self) -> &'static str {
        match self {
            HubError::Protocol(_) => "protocol_error",
            HubError::Transport(_) => "transport_error",
            HubError::WriteTimeout => "write_timeout",
            HubError::LivenessTimeout => "liveness_timeout",
            HubError::Internal(_) => "internal_error",
        }
    }
}

/// Gateway HTTP error type.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Request named an invalid area.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Area does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Directory storage failed.
    #[error("Directory storage error: {0}")]
    Storage(String),

    /// Directory service unreachable or misbehaving.
    #[error("Directory unavailable: {0}")]
    Unavailable(String),

    /// The hub actor is not running.
    #[error("Hub unavailable: {0}")]
    HubUnavailable(String),
}

impl GatewayError {
    pub fn error_code(&self) -> &'static str {
        match self {
            GatewayError::Validation(_) => "VALIDATION_ERROR",
            GatewayError::NotFound(_) => "NOT_FOUND",
            GatewayError::Storage(_) => "STORAGE_ERROR",
            GatewayError::Unavailable(_) => "DIRECTORY_UNAVAILABLE",
            GatewayError::HubUnavailable(_) => "HUB_UNAVAILABLE",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Unavailable(_) => StatusCode::BAD_GATEWAY,
            GatewayError::HubUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn client_message(&self) -> String {
        match self {
            GatewayError::Validation(reason) => reason.clone(),
            GatewayError::NotFound(_) => "Area not found".to_string(),
            GatewayError::Storage(_) => "Directory storage unavailable".to_string(),
            GatewayError::Unavailable(_) => "Directory service unavailable".to_string(),
            GatewayError::HubUnavailable(_) => "Hub unavailable".to_string(),
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

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        if let GatewayError::Storage(detail)
        | GatewayError::Unavailable(detail)
        | GatewayError::HubUnavailable(detail) = &self
        {
            tracing::warn!(target: "hub.gateway", error = %detail, code = self.error_code(), "Gateway request failed");
        }

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.client_message(),
            },
        };

        (self.status_code(), Json(error_response)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn test_codec_error_converts_to_protocol() {
        let err: HubError = CodecError::UnexpectedMessageType(7).into();
        assert!(matches!(err, HubError::Protocol(_)));
        assert_eq!(err.close_reason(), "protocol_error");
    }

    #[test]
    fn test_close_reasons() {
        assert_eq!(HubError::WriteTimeout.close_reason(), "write_timeout");
        assert_eq!(HubError::LivenessTimeout.close_reason(), "liveness_timeout");
        assert_eq!(
            HubError::Transport("reset".to_string()).close_reason(),
            "transport_error"
        );
        assert_eq!(
            HubError::Internal("closed".to_string()).close_reason(),
            "internal_error"
        );
    }

    #[test]
    fn test_gateway_status_codes() {
        assert_eq!(
            GatewayError::Validation(String::new()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::NotFound(String::new()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GatewayError::Storage(String::new()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            GatewayError::Unavailable(String::new()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            GatewayError::HubUnavailable(String::new()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn test_unavailable_response_hides_details() {
        let response =
            GatewayError::Unavailable("connection refused: 10.0.0.7:50051".to_string())
                .into_response();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "DIRECTORY_UNAVAILABLE");
        assert!(!body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("10.0.0.7"));
    }
}
