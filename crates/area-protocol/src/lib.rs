//! Binary wire protocol for Live Connections.
//!
//! Every transport message carries one or more length-prefixed frames:
//!
//! ```text
//! Frame        := Length(u16 LE) Payload(Length bytes)
//! AuthPayload  := Type(u8 = 1) AreaLen(u16 LE) Area UserLen(u16 LE) User
//! ```
//!
//! The first frame an unauthenticated connection sends must carry an
//! [`frame::AuthPayload`]. Every later frame is opaque application data.

#![warn(clippy::pedantic)]

pub mod codec;
pub mod frame;
