//! HTTP handlers for Directory Service.

pub mod areas;
pub mod health;
pub mod users;

pub use areas::{create_area, list_users};
pub use health::{health_check, readiness_check};
pub use users::add_user;
