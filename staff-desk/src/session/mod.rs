//! Session Store
//!
//! At most one live [`UserSession`] per process. Remembered credentials live
//! in a [`PreferenceStore`] so they outlast the process.

pub mod preferences;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use shared::error::ErrorCode;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

pub use preferences::PreferenceStore;

/// Role granted to every interactive login
pub const DEFAULT_ROLE: &str = "USER";

/// Preference namespace for remembered credentials
pub const PREFS_NAMESPACE: &str = "staff_desk.session";

const KEY_USERNAME: &str = "username";
const KEY_PASSWORD: &str = "password";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SessionError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::CredentialStoreFailed
    }
}

/// The authenticated user of this process
pub struct UserSession {
    username: String,
    role: String,
    logged_in_at: DateTime<Utc>,
    preferences: Arc<PreferenceStore>,
}

impl UserSession {
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn logged_in_at(&self) -> DateTime<Utc> {
        self.logged_in_at
    }

    fn matches(&self, username: &str, role: &str) -> bool {
        self.username == username && self.role == role
    }

    /// Remember credentials for the next start
    pub fn save_credentials(&self, username: &str, password: &str) -> Result<(), SessionError> {
        self.preferences
            .put_all(&[(KEY_USERNAME, username), (KEY_PASSWORD, password)])?;
        tracing::debug!(username = %username, "Credentials remembered");
        Ok(())
    }

    pub fn remembered_username(&self) -> Result<Option<String>, SessionError> {
        self.preferences.get(KEY_USERNAME)
    }

    pub fn remembered_password(&self) -> Result<Option<String>, SessionError> {
        self.preferences.get(KEY_PASSWORD)
    }

    pub fn clear_credentials(&self) -> Result<(), SessionError> {
        self.preferences.remove_all(&[KEY_USERNAME, KEY_PASSWORD])
    }
}

impl fmt::Display for UserSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "UserSession {{username='{}', role='{}'}}",
            self.username, self.role
        )
    }
}

impl fmt::Debug for UserSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserSession")
            .field("username", &self.username)
            .field("role", &self.role)
            .field("logged_in_at", &self.logged_in_at)
            .finish()
    }
}

/// Process-wide holder of the live session.
///
/// Shared through the application state; clone the `Arc` around it, not the
/// store.
pub struct SessionStore {
    current: RwLock<Option<Arc<UserSession>>>,
    preferences: Arc<PreferenceStore>,
}

impl SessionStore {
    pub fn new(prefs_dir: &Path) -> Self {
        Self {
            current: RwLock::new(None),
            preferences: Arc::new(PreferenceStore::open(prefs_dir, PREFS_NAMESPACE)),
        }
    }

    /// Return the live session for this identity, creating it when absent.
    ///
    /// A different username or role replaces the live session.
    pub fn get_or_create(&self, username: &str, role: &str) -> Arc<UserSession> {
        {
            let current = self.current.read();
            if let Some(session) = current.as_ref().filter(|s| s.matches(username, role)) {
                return Arc::clone(session);
            }
        }

        let mut current = self.current.write();
        if let Some(session) = current.as_ref() {
            if session.matches(username, role) {
                return Arc::clone(session);
            }
            tracing::info!(previous = %session.username, username = %username, "Replacing live session");
        }

        let session = Arc::new(UserSession {
            username: username.to_string(),
            role: role.to_string(),
            logged_in_at: Utc::now(),
            preferences: Arc::clone(&self.preferences),
        });
        *current = Some(Arc::clone(&session));
        tracing::info!(username = %username, role = %role, "Session created");
        session
    }

    pub fn current(&self) -> Option<Arc<UserSession>> {
        self.current.read().clone()
    }

    /// End the live session and forget its credentials.
    ///
    /// Returns `false` when there was nothing to destroy.
    pub fn destroy(&self) -> Result<bool, SessionError> {
        let mut current = self.current.write();
        let Some(session) = current.as_ref() else {
            return Ok(false);
        };
        session.clear_credentials()?;
        tracing::info!(username = %session.username, "Session destroyed");
        *current = None;
        Ok(true)
    }

    /// Credentials remembered by an earlier run, if both are present
    pub fn remembered_credentials(&self) -> Result<Option<(String, String)>, SessionError> {
        let username = self.preferences.get(KEY_USERNAME)?;
        let password = self.preferences.get(KEY_PASSWORD)?;
        Ok(username.zip(password))
    }

    /// Drop remembered credentials without touching the live session
    pub fn forget_credentials(&self) -> Result<(), SessionError> {
        self.preferences.remove_all(&[KEY_USERNAME, KEY_PASSWORD])
    }
}
