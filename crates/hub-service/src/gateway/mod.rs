//! Client-facing HTTP and WebSocket gateway.
//!
//! - [`routes`] - router and shared state
//! - [`handlers`] - area and user endpoints
//! - [`directory_client`] - directory service client
//! - [`ws`] - WebSocket upgrade into a `ConnectionActor`

pub mod directory_client;
pub mod handlers;
pub mod routes;
pub mod ws;

pub use directory_client::{DirectoryClient, HttpDirectoryClient};
pub use routes::{build_routes, GatewayState};
