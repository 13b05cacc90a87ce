use super::{Feedback, Screen};
use crate::db::{RepoResult, users};
use crate::session::DEFAULT_ROLE;
use crate::state::AppState;
use crate::validation::SignUpForm;
use shared::error::ErrorCode;
use std::sync::Arc;

pub struct SignUpController {
    state: Arc<AppState>,
}

impl SignUpController {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Validate, check uniqueness, register. A new account also becomes the
    /// live session with its credentials remembered.
    pub async fn sign_up(&self, form: &SignUpForm) -> Feedback {
        if let Err(e) = form.validate() {
            return Feedback::error(e.code(), e.to_string());
        }

        match self.register(form).await {
            Ok(feedback) => feedback,
            Err(e) => {
                tracing::error!(username = %form.username, error = %e, "Sign-up failed");
                Feedback::error(e.code(), format!("Error: {e}"))
            }
        }
    }

    async fn register(&self, form: &SignUpForm) -> RepoResult<Feedback> {
        let db = &self.state.db;

        if users::username_exists(db, &form.username).await? {
            return Ok(Feedback::error(
                ErrorCode::UsernameExists,
                "Username already exists. Please choose another.",
            ));
        }
        if users::email_exists(db, &form.email).await? {
            return Ok(Feedback::error(
                ErrorCode::EmailExists,
                "Email already exists. Please use a different email.",
            ));
        }

        let created = users::register(
            db,
            &form.first_name,
            &form.last_name,
            &form.username,
            &form.email,
            &form.password,
        )
        .await?;
        if !created {
            return Ok(Feedback::error(
                ErrorCode::AlreadyExists,
                "Failed to create account. Please try again.",
            ));
        }

        let session = self.state.sessions.get_or_create(&form.username, DEFAULT_ROLE);
        if let Err(e) = session.save_credentials(&form.username, &form.password) {
            tracing::warn!(username = %form.username, error = %e, "Failed to remember credentials");
        }
        Ok(Feedback::info("Account created successfully!").then(Screen::Login))
    }
}
