//! Unified error codes for staff-desk
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication / session errors
//! - 2xxx: Input validation errors
//! - 3xxx: Storage errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Represented as u16 values so they serialize compactly and can be shown
/// next to a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Resource already exists
    AlreadyExists = 4,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (username/password)
    InvalidCredentials = 1002,
    /// Remembered credentials could not be read or written
    CredentialStoreFailed = 1003,

    // ==================== 2xxx: Validation ====================
    /// Generic validation failure
    ValidationFailed = 2001,
    /// Required field missing
    RequiredField = 2002,
    /// Value has the wrong shape (name, username, email, rating, padded password)
    InvalidFormat = 2003,
    /// Value out of range (password length)
    ValueOutOfRange = 2004,

    // ==================== 3xxx: Storage ====================
    /// Username already taken
    UsernameExists = 3001,
    /// Email already taken
    EmailExists = 3002,
    /// Any other constraint violation reported by the engine
    ConstraintViolation = 3003,
    /// Person record not found
    PersonNotFound = 3004,

    // ==================== 9xxx: System ====================
    /// Database error
    DatabaseError = 9002,
    /// Database unreachable / connection failure
    ConnectionFailed = 9003,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::AlreadyExists => "Resource already exists",

            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid username or password",
            ErrorCode::CredentialStoreFailed => "Remembered credentials are unavailable",

            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            ErrorCode::UsernameExists => "Username already exists",
            ErrorCode::EmailExists => "Email already exists",
            ErrorCode::ConstraintViolation => "Storage constraint violated",
            ErrorCode::PersonNotFound => "Person not found",

            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConnectionFailed => "Database connection failed",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            4 => Ok(ErrorCode::AlreadyExists),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::CredentialStoreFailed),

            // Validation
            2001 => Ok(ErrorCode::ValidationFailed),
            2002 => Ok(ErrorCode::RequiredField),
            2003 => Ok(ErrorCode::InvalidFormat),
            2004 => Ok(ErrorCode::ValueOutOfRange),

            // Storage
            3001 => Ok(ErrorCode::UsernameExists),
            3002 => Ok(ErrorCode::EmailExists),
            3003 => Ok(ErrorCode::ConstraintViolation),
            3004 => Ok(ErrorCode::PersonNotFound),

            // System
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::ConnectionFailed),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
