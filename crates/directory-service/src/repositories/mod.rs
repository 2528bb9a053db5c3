//! Repository layer for Directory Service.
//!
//! Storage access follows the Handler -> Service -> Repository layering.
//! Areas are directories under the storage root; members are empty files
//! inside their area directory.

pub mod area_store;

pub use area_store::{AreaStore, FsAreaStore};
