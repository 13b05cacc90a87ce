//! Form validation
//!
//! Rules run in a fixed order and stop at the first failure, so the user
//! always sees a single message.

use regex::{Regex, RegexBuilder};
use rust_decimal::Decimal;
use shared::error::ErrorCode;
use shared::models::PersonCreate;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

/// Departments offered by the record form
pub const DEPARTMENTS: [&str; 5] = ["HR", "IT", "Finance", "Marketing", "Operations"];

/// Minimum password length for new accounts
pub const MIN_PASSWORD_LEN: usize = 8;

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z\s]{1,50}$").expect("valid name pattern"));

static USERNAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{4,20}$").expect("valid username pattern"));

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
        .case_insensitive(true)
        .build()
        .expect("valid email pattern")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("All fields are required.")]
    MissingFields,

    #[error("Please enter both username and password.")]
    MissingCredentials,

    #[error("First name must contain only letters and spaces.")]
    InvalidFirstName,

    #[error("Last name must contain only letters and spaces.")]
    InvalidLastName,

    #[error("Username must be 4-20 characters and contain only letters, numbers, and underscores.")]
    InvalidUsername,

    #[error("Please enter a valid email address.")]
    InvalidEmail,

    #[error("Password must be at least 8 characters long.")]
    PasswordTooShort,

    #[error("Password must not start or end with spaces.")]
    PasswordWhitespace,

    #[error("Performance rating must be a number.")]
    InvalidRating,
}

impl ValidationError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MissingFields | Self::MissingCredentials => ErrorCode::RequiredField,
            Self::PasswordTooShort => ErrorCode::ValueOutOfRange,
            Self::InvalidFirstName
            | Self::InvalidLastName
            | Self::InvalidUsername
            | Self::InvalidEmail
            | Self::PasswordWhitespace
            | Self::InvalidRating => ErrorCode::InvalidFormat,
        }
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

pub fn is_valid_name(value: &str) -> bool {
    NAME_PATTERN.is_match(value)
}

pub fn is_valid_username(value: &str) -> bool {
    USERNAME_PATTERN.is_match(value)
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}

/// Sign-up form as entered
#[derive(Debug, Clone, Default)]
pub struct SignUpForm {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl SignUpForm {
    /// Blank checks trim; pattern checks see the raw text.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if [
            &self.first_name,
            &self.last_name,
            &self.username,
            &self.email,
            &self.password,
        ]
        .iter()
        .any(|field| is_blank(field))
        {
            return Err(ValidationError::MissingFields);
        }
        if !is_valid_name(&self.first_name) {
            return Err(ValidationError::InvalidFirstName);
        }
        if !is_valid_name(&self.last_name) {
            return Err(ValidationError::InvalidLastName);
        }
        if !is_valid_username(&self.username) {
            return Err(ValidationError::InvalidUsername);
        }
        if !is_valid_email(&self.email) {
            return Err(ValidationError::InvalidEmail);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort);
        }
        // Login trims what it is given, so padded passwords could never match
        if self.password.trim() != self.password {
            return Err(ValidationError::PasswordWhitespace);
        }
        Ok(())
    }
}

/// Record form of the table view. The rating arrives as text.
#[derive(Debug, Clone, Default)]
pub struct RecordForm {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub department: Option<String>,
    pub performance_rating: String,
    pub image_url: Option<String>,
}

impl RecordForm {
    /// Parse the rating, then check that the NOT NULL columns are filled.
    pub fn into_person(self) -> Result<PersonCreate, ValidationError> {
        let rating = parse_rating(&self.performance_rating)?;

        if [
            &self.first_name,
            &self.last_name,
            &self.username,
            &self.email,
            &self.password,
        ]
        .iter()
        .any(|field| is_blank(field))
        {
            return Err(ValidationError::MissingFields);
        }

        Ok(PersonCreate {
            first_name: self.first_name,
            last_name: self.last_name,
            username: self.username,
            email: self.email,
            password: self.password,
            department: self.department.filter(|d| !is_blank(d)),
            performance_rating: Some(rating),
            image_url: self.image_url.filter(|u| !is_blank(u)),
        })
    }
}

/// Accepts plain and scientific notation, surrounding whitespace ignored
pub fn parse_rating(text: &str) -> Result<Decimal, ValidationError> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| ValidationError::InvalidRating)
}
