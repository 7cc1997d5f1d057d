//! Process-wide settings
//!
//! `Settings` carries the defaults every provider falls back to and the pool
//! sizing the service starts with. Built from `SEARCHPOOL_*` environment
//! variables or constructed directly.

pub mod methods;
pub mod types;

pub use types::Settings;
