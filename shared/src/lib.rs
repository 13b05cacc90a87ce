//! Shared types for staff-desk
//!
//! Records and the error vocabulary used by every layer of the application.

pub mod error;
pub mod models;

// Re-exports
pub use error::{ErrorCategory, ErrorCode};
pub use models::{Person, PersonCreate, PersonRow};
pub use serde::{Deserialize, Serialize};
