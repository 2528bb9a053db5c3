//! Actor model implementation for the Hub Service.
//!
//! ```text
//! HubActor (singleton per process)
//! ├── owns the area -> members registry
//! └── fans broadcasts out to member outbound queues
//!
//! ConnectionActor (one per WebSocket connection)
//! ├── inbound loop: decode frames, authenticate, submit intents to the hub
//! └── outbound loop: drain the outbound queue, send keep-alive pings
//! ```
//!
//! # Key Design Decisions
//!
//! - **Single owner**: Only the hub task touches the registry; connections
//!   talk to it through its `tokio::sync::mpsc` mailbox
//! - **Drop on full**: Broadcast delivery never waits on a recipient queue
//! - **CancellationToken propagation**: Connection tokens are children of the
//!   hub token, so hub shutdown closes every connection
//!
//! # Modules
//!
//! - [`connection`] - `ConnectionActor` per WebSocket connection
//! - [`hub`] - `HubActor` registry and broadcast fan-out
//! - [`messages`] - Message types for actor communication

pub mod connection;
pub mod hub;
pub mod messages;

// Re-export primary types
pub use connection::{ConnectionActor, ConnectionActorHandle, ConnectionSettings, TransportMessage};
pub use hub::{HubActor, HubHandle, HubSettings};
pub use messages::*;
