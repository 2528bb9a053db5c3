//! `HubActor` - area-scoped routing registry.
//!
//! The hub is a singleton per process:
//!
//! - Owns the area registry: area name -> members, plus a reverse index
//!   from connection to area
//! - Consumes register, unregister and broadcast intents from its mailbox,
//!   so every mutation is linearized through one task
//! - Fans out broadcasts with `try_send` and never waits on a recipient
//! - Owns the root `CancellationToken`; connection tokens are children of it
//!
//! # Backpressure
//!
//! A recipient whose outbound queue is full misses that message. After
//! `max_consecutive_drops` misses in a row it is removed and its connection
//! token is cancelled. A successful enqueue resets the count.

use crate::errors::HubError;
use crate::observability::metrics;

use super::messages::{HubMessage, HubStatus, Member};

use area_protocol::codec::encode_frame;
use bytes::Bytes;
use common::types::ConnectionId;
use std::collections::HashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Default channel buffer size for the hub mailbox.
const HUB_CHANNEL_BUFFER: usize = 1000;

/// Hub tuning knobs.
#[derive(Debug, Clone, Copy)]
pub struct HubSettings {
    /// Consecutive dropped broadcasts after which a member is disconnected.
    pub max_consecutive_drops: u32,
}

/// Handle to the `HubActor`.
#[derive(Clone, Debug)]
pub struct HubHandle {
    sender: mpsc::Sender<HubMessage>,
    cancel_token: CancellationToken,
}

impl HubHandle {
    /// Add an authenticated connection to `area`. No-op if already present.
    pub async fn register(&self, area: String, member: Member) -> Result<(), HubError> {
        self.send(HubMessage::Register { area, member }).await
    }

    /// Remove a connection from its area. No-op if unknown.
    pub async fn unregister(&self, connection_id: ConnectionId) -> Result<(), HubError> {
        self.send(HubMessage::Unregister { connection_id }).await
    }

    /// Fan a payload out to every other member of `area`.
    pub async fn broadcast(
        &self,
        area: String,
        sender: ConnectionId,
        payload: Bytes,
    ) -> Result<(), HubError> {
        self.send(HubMessage::Broadcast {
            area,
            sender,
            payload,
        })
        .await
    }

    /// Users currently connected to `area`, sorted.
    pub async fn online_users(&self, area: String) -> Result<Vec<String>, HubError> {
        let (tx, rx) = oneshot::channel();
        self.send(HubMessage::OnlineUsers {
            area,
            respond_to: tx,
        })
        .await?;

        rx.await
            .map_err(|e| HubError::Internal(format!("response receive failed: {e}")))
    }

    /// Current number of areas and registered connections.
    pub async fn status(&self) -> Result<HubStatus, HubError> {
        let (tx, rx) = oneshot::channel();
        self.send(HubMessage::GetStatus { respond_to: tx }).await?;

        rx.await
            .map_err(|e| HubError::Internal(format!("response receive failed: {e}")))
    }

    /// Stop the hub. Cancellation cascades to every connection token.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }

    /// Check if the hub is cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Get a child token for a new connection.
    #[must_use]
    pub fn child_token(&self) -> CancellationToken {
        self.cancel_token.child_token()
    }

    async fn send(&self, message: HubMessage) -> Result<(), HubError> {
        self.sender
            .send(message)
            .await
            .map_err(|e| HubError::Internal(format!("channel send failed: {e}")))
    }
}

/// The `HubActor` implementation.
pub struct HubActor {
    receiver: mpsc::Receiver<HubMessage>,
    cancel_token: CancellationToken,
    settings: HubSettings,
    /// Members by area.
    areas: HashMap<String, HashMap<ConnectionId, Member>>,
    /// Area of each registered connection.
    index: HashMap<ConnectionId, String>,
}

impl HubActor {
    /// Spawn the hub actor.
    ///
    /// Returns a handle and the task join handle.
    pub fn spawn(settings: HubSettings) -> (HubHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(HUB_CHANNEL_BUFFER);
        let cancel_token = CancellationToken::new();

        let actor = Self {
            receiver,
            cancel_token: cancel_token.clone(),
            settings,
            areas: HashMap::new(),
            index: HashMap::new(),
        };

        let task_handle = tokio::spawn(actor.run());

        (
            HubHandle {
                sender,
                cancel_token,
            },
            task_handle,
        )
    }

    /// Run the actor message loop.
    #[instrument(skip_all, name = "hub.actor.hub")]
    async fn run(mut self) {
        info!(target: "hub.actor.hub", "HubActor started");

        loop {
            tokio::select! {
                biased;

                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "hub.actor.hub",
                        connections = self.index.len(),
                        "HubActor received cancellation signal"
                    );
                    self.disconnect_all();
                    break;
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => self.handle_message(message),
                        None => {
                            info!(target: "hub.actor.hub", "HubActor channel closed, exiting");
                            break;
                        }
                    }
                }
            }
        }

        info!(target: "hub.actor.hub", "HubActor stopped");
    }

    fn handle_message(&mut self, message: HubMessage) {
        match message {
            HubMessage::Register { area, member } => self.register(area, member),

            HubMessage::Unregister { connection_id } => {
                if self.remove(connection_id).is_some() {
                    debug!(
                        target: "hub.actor.hub",
                        connection_id = %connection_id,
                        "Connection unregistered"
                    );
                }
            }

            HubMessage::Broadcast {
                area,
                sender,
                payload,
            } => self.broadcast(&area, sender, &payload),

            HubMessage::OnlineUsers { area, respond_to } => {
                let _ = respond_to.send(self.online_users(&area));
            }

            HubMessage::GetStatus { respond_to } => {
                let _ = respond_to.send(self.status());
            }
        }
    }

    fn register(&mut self, area: String, member: Member) {
        let connection_id = member.connection_id;

        if self.index.contains_key(&connection_id) {
            debug!(
                target: "hub.actor.hub",
                connection_id = %connection_id,
                "Connection already registered"
            );
            return;
        }

        debug!(
            target: "hub.actor.hub",
            connection_id = %connection_id,
            area = %area,
            user = %member.user,
            "Connection registered"
        );

        self.areas
            .entry(area.clone())
            .or_default()
            .insert(connection_id, member);
        self.index.insert(connection_id, area);
        self.update_gauges();
    }

    /// Remove a member, dropping its area when it becomes empty.
    fn remove(&mut self, connection_id: ConnectionId) -> Option<Member> {
        let area = self.index.remove(&connection_id)?;

        let (member, now_empty) = match self.areas.get_mut(&area) {
            Some(members) => (members.remove(&connection_id), members.is_empty()),
            None => (None, false),
        };

        if now_empty {
            self.areas.remove(&area);
            debug!(target: "hub.actor.hub", area = %area, "Area emptied");
        }

        self.update_gauges();
        member
    }

    fn broadcast(&mut self, area: &str, sender: ConnectionId, payload: &Bytes) {
        let max_drops = self.settings.max_consecutive_drops;
        let Some(members) = self.areas.get_mut(area) else {
            return;
        };

        let frame = match encode_frame(payload) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(target: "hub.actor.hub", error = %e, "Dropping unframeable broadcast");
                return;
            }
        };

        let mut closed = Vec::new();
        let mut slow = Vec::new();
        let mut recipients = 0usize;

        for (id, member) in members.iter_mut() {
            if *id == sender {
                continue;
            }
            recipients += 1;

            match member.outbound.try_send(frame.clone()) {
                Ok(()) => member.consecutive_drops = 0,
                Err(TrySendError::Full(_)) => {
                    member.consecutive_drops = member.consecutive_drops.saturating_add(1);
                    metrics::record_message_dropped("queue_full");
                    if member.consecutive_drops >= max_drops {
                        slow.push(*id);
                    }
                }
                Err(TrySendError::Closed(_)) => {
                    metrics::record_message_dropped("closed");
                    closed.push(*id);
                }
            }
        }

        metrics::record_broadcast(recipients);

        for id in closed {
            self.remove(id);
        }

        for id in slow {
            if let Some(member) = self.remove(id) {
                warn!(
                    target: "hub.actor.hub",
                    connection_id = %id,
                    drops = member.consecutive_drops,
                    "Disconnecting slow consumer"
                );
                member.cancel_token.cancel();
                metrics::record_forced_disconnect();
            }
        }
    }

    fn online_users(&self, area: &str) -> Vec<String> {
        let mut users: Vec<String> = self
            .areas
            .get(area)
            .map(|members| members.values().map(|m| m.user.clone()).collect())
            .unwrap_or_default();
        users.sort();
        users
    }

    fn status(&self) -> HubStatus {
        HubStatus {
            areas: self.areas.len(),
            connections: self.index.len(),
        }
    }

    fn disconnect_all(&mut self) {
        for member in self.areas.values().flat_map(HashMap::values) {
            member.cancel_token.cancel();
        }
        self.areas.clear();
        self.index.clear();
        self.update_gauges();
    }

    fn update_gauges(&self) {
        metrics::set_connections_registered(self.index.len());
        metrics::set_areas_active(self.areas.len());
    }
}
