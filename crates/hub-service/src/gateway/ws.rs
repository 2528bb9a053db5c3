//! WebSocket upgrade and socket adaptation.
//!
//! Splits an axum `WebSocket` into a stream and a sink of
//! `TransportMessage` and hands them to a `ConnectionActor`.

use crate::actors::{ConnectionActor, TransportMessage};
use crate::errors::HubError;
use crate::gateway::routes::GatewayState;

use area_protocol::frame::LENGTH_PREFIX_SIZE;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::future::ready;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{debug, warn};

/// `GET /ws` - upgrade to a WebSocket and attach a connection actor.
///
/// Upgrades from an origin outside `allowed_origins` are refused with 403.
/// Inbound messages are capped at one maximum-size frame plus its prefix.
pub async fn ws_handler(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let origin = headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok());
    if !origin_allowed(&state.allowed_origins, origin) {
        warn!(
            target: "hub.gateway.ws",
            origin = origin.unwrap_or("<none>"),
            "WebSocket upgrade from disallowed origin"
        );
        return StatusCode::FORBIDDEN.into_response();
    }

    let limit = state.connection_settings.max_payload + LENGTH_PREFIX_SIZE;

    ws.max_message_size(limit)
        .max_frame_size(limit)
        .on_upgrade(move |socket| serve_socket(socket, state))
}

async fn serve_socket(socket: WebSocket, state: Arc<GatewayState>) {
    let (sink, stream) = socket.split();

    let stream = stream.map(from_ws);
    let sink = sink
        .with(|message: TransportMessage| ready(Ok::<Message, axum::Error>(to_ws(message))))
        .sink_map_err(|e| HubError::Transport(e.to_string()));

    let (handle, task) = ConnectionActor::spawn(
        stream,
        sink,
        state.hub.clone(),
        state.connection_settings,
        state.hub.child_token(),
    );

    debug!(
        target: "hub.gateway.ws",
        connection_id = %handle.connection_id(),
        "WebSocket connection accepted"
    );

    if let Err(e) = task.await {
        warn!(
            target: "hub.gateway.ws",
            connection_id = %handle.connection_id(),
            error = %e,
            "Connection task failed"
        );
    }
}

/// An empty allow-list accepts every request, with or without `Origin`.
fn origin_allowed(allowed: &[String], origin: Option<&str>) -> bool {
    if allowed.is_empty() {
        return true;
    }
    origin.is_some_and(|origin| allowed.iter().any(|a| a.eq_ignore_ascii_case(origin)))
}

fn from_ws(message: Result<Message, axum::Error>) -> Result<TransportMessage, HubError> {
    match message {
        Ok(Message::Binary(data)) => Ok(TransportMessage::Data(Bytes::from(data))),
        Ok(Message::Ping(_)) => Ok(TransportMessage::Ping),
        Ok(Message::Pong(_)) => Ok(TransportMessage::Pong),
        Ok(Message::Close(_)) => Ok(TransportMessage::Close),
        Ok(Message::Text(_)) => Err(HubError::Transport(
            "text messages are not supported".to_string(),
        )),
        Err(e) => Err(HubError::Transport(e.to_string())),
    }
}

fn to_ws(message: TransportMessage) -> Message {
    match message {
        TransportMessage::Data(data) => Message::Binary(data.to_vec()),
        TransportMessage::Ping => Message::Ping(Vec::new()),
        TransportMessage::Pong => Message::Pong(Vec::new()),
        TransportMessage::Close => Message::Close(None),
    }
}
