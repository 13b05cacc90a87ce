//! Person Model
//!
//! One row of the `users` table. A passive record: uniqueness and range
//! checks happen in the data access layer before anything is persisted.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Employee record
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    /// Assigned by storage; `None` until persisted
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    /// Unique across all persons
    pub username: String,
    /// Unique across all persons
    pub email: String,
    /// Stored credential (PHC hash, or verbatim under the legacy policy)
    #[serde(skip_serializing, default)]
    pub password: String,
    pub department: Option<String>,
    /// DECIMAL(4,2)
    #[serde(with = "rust_decimal::serde::float_option", default)]
    pub performance_rating: Option<Decimal>,
    pub image_url: Option<String>,
}

impl Person {
    /// Build a record that has not been persisted yet
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            username: username.into(),
            email: email.into(),
            password: password.into(),
            department: None,
            performance_rating: None,
            image_url: None,
        }
    }

    /// Build a record carrying its storage identity
    pub fn with_id(
        id: i64,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id),
            ..Self::new(first_name, last_name, username, email, password)
        }
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn with_performance_rating(mut self, rating: Decimal) -> Self {
        self.performance_rating = Some(rating);
        self
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl fmt::Debug for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Person")
            .field("id", &self.id)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("department", &self.department)
            .field("performance_rating", &self.performance_rating)
            .field("image_url", &self.image_url)
            .finish()
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn opt<T: fmt::Display>(value: &Option<T>) -> String {
            value
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".to_string())
        }

        write!(
            f,
            "Person {{ID={}, First Name='{}', Last Name='{}', Username='{}', Email='{}', Department='{}', Performance Rating={}, Image='{}'}}",
            opt(&self.id),
            self.first_name,
            self.last_name,
            self.username,
            self.email,
            opt(&self.department),
            opt(&self.performance_rating),
            opt(&self.image_url),
        )
    }
}

/// Add-record payload (table view)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonCreate {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub department: Option<String>,
    #[serde(with = "rust_decimal::serde::float_option", default)]
    pub performance_rating: Option<Decimal>,
    pub image_url: Option<String>,
}

impl From<PersonCreate> for Person {
    fn from(data: PersonCreate) -> Self {
        Self {
            id: None,
            first_name: data.first_name,
            last_name: data.last_name,
            username: data.username,
            email: data.email,
            password: data.password,
            department: data.department,
            performance_rating: data.performance_rating,
            image_url: data.image_url,
        }
    }
}

/// Row of the `users` table as read back from storage.
///
/// The rating column is selected as REAL; [`From<PersonRow>`] rounds it back
/// to two decimal places.
#[derive(Clone)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PersonRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub password: String,
    pub department: Option<String>,
    pub performance_rating: Option<f64>,
    pub email: String,
    pub image_url: Option<String>,
}

impl From<PersonRow> for Person {
    fn from(row: PersonRow) -> Self {
        Self {
            id: Some(row.id),
            first_name: row.first_name,
            last_name: row.last_name,
            username: row.username,
            email: row.email,
            password: row.password,
            department: row.department,
            performance_rating: row
                .performance_rating
                .and_then(Decimal::from_f64_retain)
                .map(|d| d.round_dp(2)),
            image_url: row.image_url,
        }
    }
}
