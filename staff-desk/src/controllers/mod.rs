//! Screen controllers
//!
//! Each controller turns user input into data layer calls and answers with a
//! [`Feedback`] the front end shows verbatim.

pub mod login;
pub mod signup;
pub mod table;

pub use login::LoginController;
pub use signup::SignUpController;
pub use table::TableController;

use serde::Serialize;
use shared::error::{ErrorCategory, ErrorCode};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Error,
}

/// Screens a controller can navigate to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Login,
    SignUp,
    Main,
}

/// Outcome of a user action
///
/// Errors carry the [`ErrorCode`] of their cause; informational feedback is
/// always [`ErrorCode::Success`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feedback {
    pub level: Level,
    pub code: ErrorCode,
    pub message: String,
    pub next: Option<Screen>,
}

impl Feedback {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            code: ErrorCode::Success,
            message: message.into(),
            next: None,
        }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            code,
            message: message.into(),
            next: None,
        }
    }

    pub fn then(mut self, screen: Screen) -> Self {
        self.next = Some(screen);
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }

    /// Process exit status: 0 for success, 2 when the user has to correct
    /// their input or log in, 1 for storage and system failures.
    pub fn exit_status(&self) -> u8 {
        if !self.is_error() {
            return 0;
        }
        match self.code.category() {
            ErrorCategory::Auth | ErrorCategory::Validation => 2,
            ErrorCategory::General | ErrorCategory::Storage | ErrorCategory::System => 1,
        }
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_status_follows_error_category() {
        assert_eq!(Feedback::info("Logged out.").exit_status(), 0);
        assert_eq!(
            Feedback::error(ErrorCode::InvalidCredentials, "Invalid username or password.")
                .exit_status(),
            2
        );
        assert_eq!(Feedback::error(ErrorCode::RequiredField, "x").exit_status(), 2);
        assert_eq!(Feedback::error(ErrorCode::UsernameExists, "x").exit_status(), 1);
        assert_eq!(Feedback::error(ErrorCode::ConnectionFailed, "x").exit_status(), 1);
        assert_eq!(Feedback::error(ErrorCode::AlreadyExists, "x").exit_status(), 1);
    }

    #[test]
    fn test_serialises_code_as_number() {
        let feedback = Feedback::error(ErrorCode::NotAuthenticated, "Please log in first.")
            .then(Screen::Login);
        let json = serde_json::to_value(&feedback).unwrap();
        assert_eq!(json["level"], "error");
        assert_eq!(json["code"], 1001);
        assert_eq!(json["next"], "login");
    }
}
