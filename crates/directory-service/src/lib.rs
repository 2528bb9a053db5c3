//! Directory Service
//!
//! Area and user registry for the live connection hub. Areas are directories
//! under a storage root and users are empty member records inside them.
//! The service exposes CreateArea, ListUsers and AddUser as JSON over HTTP.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
