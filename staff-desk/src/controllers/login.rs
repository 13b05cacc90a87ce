use super::{Feedback, Screen};
use crate::db::users;
use crate::session::{DEFAULT_ROLE, UserSession};
use crate::state::AppState;
use crate::validation::ValidationError;
use shared::error::ErrorCode;
use std::sync::Arc;

pub struct LoginController {
    state: Arc<AppState>,
}

impl LoginController {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Surrounding whitespace is ignored for both fields.
    pub async fn login(&self, username: &str, password: &str) -> Feedback {
        let username = username.trim();
        let password = password.trim();
        if username.is_empty() || password.is_empty() {
            let e = ValidationError::MissingCredentials;
            return Feedback::error(e.code(), e.to_string());
        }

        match users::verify_credentials(&self.state.db, username, password).await {
            Ok(true) => {
                self.open_session(username, password);
                Feedback::info(format!("Logged in as {username}.")).then(Screen::Main)
            }
            Ok(false) => {
                tracing::info!(username = %username, "Login rejected");
                Feedback::error(ErrorCode::InvalidCredentials, "Invalid username or password.")
            }
            Err(e) => {
                tracing::error!(username = %username, error = %e, "Login failed");
                Feedback::error(e.code(), format!("Error during login: {e}"))
            }
        }
    }

    /// Restore the session from remembered credentials.
    ///
    /// Returns the live session when there already is one. Credentials that
    /// no longer verify are forgotten.
    pub async fn resume(&self) -> Option<Arc<UserSession>> {
        if let Some(session) = self.state.sessions.current() {
            return Some(session);
        }

        let (username, password) = match self.state.sessions.remembered_credentials() {
            Ok(Some(credentials)) => credentials,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read remembered credentials");
                return None;
            }
        };

        match users::verify_credentials(&self.state.db, &username, &password).await {
            Ok(true) => {
                tracing::debug!(username = %username, "Session resumed");
                Some(self.state.sessions.get_or_create(&username, DEFAULT_ROLE))
            }
            Ok(false) => {
                tracing::info!(username = %username, "Remembered credentials are stale");
                if let Err(e) = self.state.sessions.forget_credentials() {
                    tracing::warn!(error = %e, "Failed to forget stale credentials");
                }
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "Could not verify remembered credentials");
                None
            }
        }
    }

    /// Without a live session, remembered credentials are still dropped.
    pub fn logout(&self) -> Feedback {
        match self.state.sessions.destroy() {
            Ok(true) => Feedback::info("Logged out.").then(Screen::Login),
            Ok(false) => match self.state.sessions.forget_credentials() {
                Ok(()) => Feedback::info("No active session.").then(Screen::Login),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to forget credentials");
                    Feedback::error(e.code(), format!("Error during logout: {e}"))
                }
            },
            Err(e) => {
                tracing::error!(error = %e, "Logout failed");
                Feedback::error(e.code(), format!("Error during logout: {e}"))
            }
        }
    }

    fn open_session(&self, username: &str, password: &str) -> Arc<UserSession> {
        let session = self.state.sessions.get_or_create(username, DEFAULT_ROLE);
        if let Err(e) = session.save_credentials(username, password) {
            tracing::warn!(username = %username, error = %e, "Failed to remember credentials");
        }
        session
    }
}
