//! Common utilities and types shared across Live Connections components.

#![warn(clippy::pedantic)]

/// Module for common data types
pub mod types;

/// Module for area/user identifier generation and validation
pub mod naming;
