//! Data models
//!
//! Shared between the data access layer, the controllers and the CLI.
//! IDs are `i64` (SQLite INTEGER PRIMARY KEY).

pub mod person;

// Re-exports
pub use person::*;
