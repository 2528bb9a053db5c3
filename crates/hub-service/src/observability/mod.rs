//! Observability module for Hub Service
//!
//! Metric labels are bounded to prevent cardinality explosion:
//! - `reason` on drops: `queue_full`, `closed`
//! - `reason` on closes: bounded by `HubError::close_reason` plus `closed` for orderly shutdown
//!
//! # Metrics
//!
//! | Metric | Type | Labels | Purpose |
//! |--------|------|--------|---------|
//! | `hub_connections_active` | Gauge | none | Open WebSocket connections, authenticated or not |
//! | `hub_connections_registered` | Gauge | none | Authenticated connections known to the hub |
//! | `hub_areas_active` | Gauge | none | Areas with at least one member |
//! | `hub_messages_broadcast_total` | Counter | none | Broadcast intents processed |
//! | `hub_broadcast_fanout` | Histogram | none | Recipients per broadcast |
//! | `hub_messages_dropped_total` | Counter | `reason` | Frames not delivered to a recipient |
//! | `hub_forced_disconnects_total` | Counter | none | Slow consumers disconnected by the hub |
//! | `hub_protocol_violations_total` | Counter | none | Connections closed for malformed input |
//! | `hub_connections_closed_total` | Counter | `reason` | Connection close reasons |

pub mod health;
pub mod metrics;

pub use health::{health_router, HealthState};
