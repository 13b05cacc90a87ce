//! Employee Manager Pro
//!
//! Employee records backed by an embedded SQL database: account sign-up and
//! login, a remembered session, and a record table with add and delete.

pub mod config;
pub mod controllers;
pub mod db;
pub mod logger;
pub mod session;
pub mod state;
pub mod validation;

pub use config::Config;
pub use db::{Database, RepoError, RepoResult};
pub use session::{SessionStore, UserSession};
pub use state::AppState;
