//! Application state shared by the controllers

use crate::config::Config;
use crate::db::Database;
use crate::session::SessionStore;
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub sessions: SessionStore,
}

impl AppState {
    /// Build the state. No database connection is opened here.
    pub fn new(config: Config) -> Arc<Self> {
        let db = Database::new(&config.database, config.password_policy);
        let sessions = SessionStore::new(&config.prefs_dir);
        Arc::new(Self {
            config,
            db,
            sessions,
        })
    }
}
