//! `ConnectionActor` - per-socket connection actor.
//!
//! Each `ConnectionActor`:
//! - Owns exactly one transport, split into a stream half and a sink half
//! - Runs an inbound loop (decode, authenticate, submit intents to the hub)
//!   and an outbound loop (drain the outbound queue, keep-alive pings)
//! - Is registered with the hub only after a valid auth handshake
//!
//! # Lifecycle
//!
//! `Connecting -> Unauthenticated -> Authenticated -> Closed`
//!
//! 1. Spawned by the gateway after the WebSocket upgrade
//! 2. The first frame must be an auth payload; anything else closes the
//!    connection without touching the hub
//! 3. Whichever loop ends first cancels the connection token and the other
//!    loop follows. The hub can cancel the token too (slow consumer)
//! 4. The supervising task waits for both loops, then unregisters once if
//!    the connection had registered
//!
//! # Liveness
//!
//! The read deadline starts at `liveness_timeout` and is pushed out only when
//! a pong arrives. Pings go out every `keepalive_period`, 90% of the timeout,
//! so a healthy peer always answers before the deadline.

use crate::errors::HubError;
use crate::observability::metrics;

use super::hub::HubHandle;
use super::messages::Member;

use area_protocol::codec::{decode_auth, decode_frames, CodecError};
use bytes::{Bytes, BytesMut};
use common::types::ConnectionId;
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// One message on the underlying transport.
///
/// The WebSocket glue maps socket messages to and from this type so the
/// actor can run over any stream/sink pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportMessage {
    /// Binary data carrying one or more frames.
    Data(Bytes),
    /// Keep-alive ping.
    Ping,
    /// Keep-alive reply.
    Pong,
    /// Orderly close.
    Close,
}

/// Per-connection settings.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    /// Time without a pong before the connection is closed.
    pub liveness_timeout: Duration,
    /// Deadline for a single outbound write.
    pub write_timeout: Duration,
    /// Largest accepted inbound frame payload.
    pub max_payload: usize,
    /// Capacity of the outbound queue.
    pub outbound_capacity: usize,
}

impl ConnectionSettings {
    /// Interval between keep-alive pings.
    #[must_use]
    pub fn keepalive_period(&self) -> Duration {
        self.liveness_timeout * 9 / 10
    }
}

/// Handle to a `ConnectionActor`.
#[derive(Clone, Debug)]
pub struct ConnectionActorHandle {
    connection_id: ConnectionId,
    cancel_token: CancellationToken,
}

impl ConnectionActorHandle {
    /// Get the connection ID.
    #[must_use]
    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Close the connection.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Check if the connection is closing or closed.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

/// The `ConnectionActor` implementation.
pub struct ConnectionActor<St, Si> {
    connection_id: ConnectionId,
    stream: St,
    sink: Si,
    hub: HubHandle,
    settings: ConnectionSettings,
    cancel_token: CancellationToken,
}

impl<St, Si> ConnectionActor<St, Si>
where
    St: Stream<Item = Result<TransportMessage, HubError>> + Send + Unpin + 'static,
    Si: Sink<TransportMessage, Error = HubError> + Send + Unpin + 'static,
{
    /// Spawn a connection actor over a transport.
    ///
    /// `cancel_token` should be a child of the hub's token. Returns a handle
    /// and the supervising task's join handle, which completes once both
    /// loops have stopped and the hub has been told.
    pub fn spawn(
        stream: St,
        sink: Si,
        hub: HubHandle,
        settings: ConnectionSettings,
        cancel_token: CancellationToken,
    ) -> (ConnectionActorHandle, JoinHandle<()>) {
        let connection_id = ConnectionId::new();

        let actor = Self {
            connection_id,
            stream,
            sink,
            hub,
            settings,
            cancel_token: cancel_token.clone(),
        };

        let task_handle = tokio::spawn(actor.run());

        (
            ConnectionActorHandle {
                connection_id,
                cancel_token,
            },
            task_handle,
        )
    }

    /// Supervise the inbound and outbound loops.
    #[instrument(skip_all, name = "hub.actor.connection", fields(connection_id = %self.connection_id))]
    async fn run(self) {
        let Self {
            connection_id,
            stream,
            sink,
            hub,
            settings,
            cancel_token,
        } = self;

        metrics::connection_opened();
        debug!(
            target: "hub.actor.connection",
            connection_id = %connection_id,
            "ConnectionActor started"
        );

        let (outbound_tx, outbound_rx) = mpsc::channel(settings.outbound_capacity);
        let registered = Arc::new(AtomicBool::new(false));

        let inbound = Inbound {
            connection_id,
            hub: hub.clone(),
            settings,
            cancel_token: cancel_token.clone(),
            outbound: outbound_tx,
            registered: Arc::clone(&registered),
            session: None,
        };

        let inbound_task = tokio::spawn(inbound.run(stream));
        let outbound_task = tokio::spawn(outbound_loop(
            sink,
            outbound_rx,
            settings,
            cancel_token.clone(),
        ));

        let (inbound_result, outbound_result) = tokio::join!(inbound_task, outbound_task);

        // Covers a panicked loop too
        cancel_token.cancel();

        let reason = match (flatten(inbound_result), flatten(outbound_result)) {
            (Err(e), _) | (Ok(()), Err(e)) => {
                if matches!(e, HubError::Protocol(_)) {
                    metrics::record_protocol_violation();
                }
                debug!(
                    target: "hub.actor.connection",
                    connection_id = %connection_id,
                    error = %e,
                    "Connection terminated"
                );
                e.close_reason()
            }
            (Ok(()), Ok(())) => "closed",
        };

        if registered.load(Ordering::SeqCst) {
            if let Err(e) = hub.unregister(connection_id).await {
                warn!(
                    target: "hub.actor.connection",
                    connection_id = %connection_id,
                    error = %e,
                    "Failed to unregister connection"
                );
            }
        }

        metrics::connection_closed(reason);
        info!(
            target: "hub.actor.connection",
            connection_id = %connection_id,
            reason = reason,
            "ConnectionActor stopped"
        );
    }
}

fn flatten(result: Result<Result<(), HubError>, tokio::task::JoinError>) -> Result<(), HubError> {
    result.map_err(|e| HubError::Internal(format!("connection task failed: {e}")))?
}

/// Area and user bound by a successful handshake.
struct Session {
    area: String,
}

/// State of the inbound loop.
struct Inbound {
    connection_id: ConnectionId,
    hub: HubHandle,
    settings: ConnectionSettings,
    cancel_token: CancellationToken,
    /// Write side of the outbound queue, handed to the hub on registration.
    outbound: mpsc::Sender<Bytes>,
    registered: Arc<AtomicBool>,
    /// `None` until authenticated; immutable afterwards.
    session: Option<Session>,
}

impl Inbound {
    async fn run<St>(mut self, mut stream: St) -> Result<(), HubError>
    where
        St: Stream<Item = Result<TransportMessage, HubError>> + Unpin,
    {
        let result = self.read_loop(&mut stream).await;
        self.cancel_token.cancel();
        result
    }

    async fn read_loop<St>(&mut self, stream: &mut St) -> Result<(), HubError>
    where
        St: Stream<Item = Result<TransportMessage, HubError>> + Unpin,
    {
        let liveness = self.settings.liveness_timeout;
        let deadline = tokio::time::sleep(liveness);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                biased;

                () = self.cancel_token.cancelled() => return Ok(()),

                () = &mut deadline => return Err(HubError::LivenessTimeout),

                next = stream.next() => match next {
                    None | Some(Ok(TransportMessage::Close)) => {
                        debug!(
                            target: "hub.actor.connection",
                            connection_id = %self.connection_id,
                            "Peer closed connection"
                        );
                        return Ok(());
                    }
                    Some(Err(e)) => return Err(e),
                    Some(Ok(TransportMessage::Pong)) => {
                        deadline.as_mut().reset(Instant::now() + liveness);
                    }
                    // Answered by the transport layer
                    Some(Ok(TransportMessage::Ping)) => {}
                    Some(Ok(TransportMessage::Data(data))) => self.handle_data(data).await?,
                },
            }
        }
    }

    /// Handle one transport message, which may carry several frames.
    async fn handle_data(&mut self, data: Bytes) -> Result<(), HubError> {
        if data.is_empty() {
            return Err(CodecError::InsufficientData {
                expected: area_protocol::frame::LENGTH_PREFIX_SIZE,
                available: 0,
            }
            .into());
        }

        for frame in decode_frames(data, self.settings.max_payload) {
            let payload = frame?;
            match &self.session {
                None => self.authenticate(&payload).await?,
                Some(session) => {
                    self.hub
                        .broadcast(session.area.clone(), self.connection_id, payload)
                        .await?;
                }
            }
        }

        Ok(())
    }

    async fn authenticate(&mut self, payload: &[u8]) -> Result<(), HubError> {
        let auth = decode_auth(payload).map_err(|e| {
            warn!(
                target: "hub.actor.connection",
                connection_id = %self.connection_id,
                error = %e,
                "Invalid handshake"
            );
            e
        })?;

        let member = Member::new(
            self.connection_id,
            auth.user.clone(),
            self.outbound.clone(),
            self.cancel_token.clone(),
        );

        self.registered.store(true, Ordering::SeqCst);
        self.hub.register(auth.area.clone(), member).await?;

        info!(
            target: "hub.actor.connection",
            connection_id = %self.connection_id,
            area = %auth.area,
            user = %auth.user,
            "Connection authenticated"
        );

        self.session = Some(Session { area: auth.area });
        Ok(())
    }
}

/// Drain the outbound queue and send keep-alive pings until cancelled or a
/// write fails. Frames already queued when one is received are written
/// together as a single transport message. The sink is closed once on exit.
async fn outbound_loop<Si>(
    mut sink: Si,
    mut queue: mpsc::Receiver<Bytes>,
    settings: ConnectionSettings,
    cancel_token: CancellationToken,
) -> Result<(), HubError>
where
    Si: Sink<TransportMessage, Error = HubError> + Unpin,
{
    let period = settings.keepalive_period();
    let mut keepalive = tokio::time::interval_at(Instant::now() + period, period);
    keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let result = loop {
        tokio::select! {
            biased;

            () = cancel_token.cancelled() => break Ok(()),

            next = queue.recv() => {
                let Some(first) = next else { break Ok(()) };
                let batch = drain_batch(first, &mut queue);
                if let Err(e) = write(&mut sink, TransportMessage::Data(batch), settings.write_timeout).await {
                    break Err(e);
                }
            }

            _ = keepalive.tick() => {
                if let Err(e) = write(&mut sink, TransportMessage::Ping, settings.write_timeout).await {
                    break Err(e);
                }
            }
        }
    };

    cancel_token.cancel();

    match tokio::time::timeout(settings.write_timeout, sink.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!(target: "hub.actor.connection", error = %e, "Sink close failed"),
        Err(_) => debug!(target: "hub.actor.connection", "Sink close timed out"),
    }

    result
}

/// Concatenate `first` with every frame already waiting in the queue.
fn drain_batch(first: Bytes, queue: &mut mpsc::Receiver<Bytes>) -> Bytes {
    let mut pending = Vec::new();
    while let Ok(next) = queue.try_recv() {
        pending.push(next);
    }

    if pending.is_empty() {
        return first;
    }

    let total = first.len() + pending.iter().map(Bytes::len).sum::<usize>();
    let mut batch = BytesMut::with_capacity(total);
    batch.extend_from_slice(&first);
    for frame in &pending {
        batch.extend_from_slice(frame);
    }
    batch.freeze()
}

async fn write<Si>(sink: &mut Si, message: TransportMessage, deadline: Duration) -> Result<(), HubError>
where
    Si: Sink<TransportMessage, Error = HubError> + Unpin,
{
    tokio::time::timeout(deadline, sink.send(message))
        .await
        .map_err(|_| HubError::WriteTimeout)?
}
