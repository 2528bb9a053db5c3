//! Message types for actor communication.
//!
//! Connection actors submit intents to the hub over its `tokio::sync::mpsc`
//! mailbox. Queries reply through `tokio::sync::oneshot`.

use bytes::Bytes;
use common::types::ConnectionId;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// Messages sent to `HubActor`.
#[derive(Debug)]
pub enum HubMessage {
    /// Add an authenticated connection to an area.
    Register { area: String, member: Member },

    /// Remove a connection from whichever area holds it.
    Unregister { connection_id: ConnectionId },

    /// Deliver a payload to every member of `area` except `sender`.
    Broadcast {
        area: String,
        sender: ConnectionId,
        payload: Bytes,
    },

    /// Users currently connected to an area.
    OnlineUsers {
        area: String,
        respond_to: oneshot::Sender<Vec<String>>,
    },

    /// Current hub status.
    GetStatus { respond_to: oneshot::Sender<HubStatus> },
}

/// A registered connection as seen by the hub.
///
/// Holds the write side of the connection's outbound queue and its
/// cancellation token, so the hub can deliver frames and force a disconnect.
#[derive(Debug)]
pub struct Member {
    pub connection_id: ConnectionId,
    pub user: String,
    pub outbound: mpsc::Sender<Bytes>,
    pub cancel_token: CancellationToken,
    /// Broadcasts dropped in a row because the outbound queue was full.
    pub consecutive_drops: u32,
}

impl Member {
    #[must_use]
    pub fn new(
        connection_id: ConnectionId,
        user: impl Into<String>,
        outbound: mpsc::Sender<Bytes>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            connection_id,
            user: user.into(),
            outbound,
            cancel_token,
            consecutive_drops: 0,
        }
    }
}

/// Snapshot of hub state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubStatus {
    /// Areas with at least one registered connection.
    pub areas: usize,
    /// Registered connections across all areas.
    pub connections: usize,
}
