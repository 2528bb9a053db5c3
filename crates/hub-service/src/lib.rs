//! Hub Service
//!
//! Live connection hub for the area-scoped broadcast system. Clients connect
//! over WebSocket, authenticate with a binary handshake naming their area and
//! user, and every frame they send afterwards is fanned out to the other
//! members of the same area.
//!
//! # Architecture
//!
//! - [`actors::hub`] - single owner of the area registry
//! - [`actors::connection`] - one actor per socket with inbound and outbound loops
//! - [`gateway`] - HTTP endpoints, WebSocket upgrade, directory client
//! - [`observability`] - metrics, health checks

pub mod actors;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod observability;
