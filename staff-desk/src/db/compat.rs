//! Boolean-style facade over the users repository.
//!
//! Older callers treat every failure as "no": a failed existence check reads
//! as "absent", a failed registration or login as `false`, a failed fetch as
//! whatever rows were read before the error. Failures are still logged.

use super::Database;
use super::users;
use shared::models::Person;
use sqlx::Sqlite;
use sqlx::pool::PoolConnection;

/// Legacy call surface; see the module docs for the failure contract.
#[derive(Clone)]
pub struct LegacyUsers {
    db: Database,
}

impl LegacyUsers {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// `true` when at least one user is registered, `false` on any failure
    pub async fn ensure_schema(&self) -> bool {
        self.db.ensure_schema().await.unwrap_or_else(|e| {
            tracing::error!(error = %e, "Schema bootstrap failed");
            false
        })
    }

    /// Pooled connection, `None` when the database cannot be reached
    pub async fn open_connection(&self) -> Option<PoolConnection<Sqlite>> {
        self.db
            .open_connection()
            .await
            .map_err(|e| tracing::error!(error = %e, "Opening a connection failed"))
            .ok()
    }

    pub async fn username_exists(&self, username: &str) -> bool {
        users::username_exists(&self.db, username)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Username lookup failed");
                false
            })
    }

    pub async fn email_exists(&self, email: &str) -> bool {
        users::email_exists(&self.db, email).await.unwrap_or_else(|e| {
            tracing::error!(error = %e, "Email lookup failed");
            false
        })
    }

    pub async fn register(
        &self,
        first_name: &str,
        last_name: &str,
        username: &str,
        email: &str,
        password: &str,
    ) -> bool {
        users::register(&self.db, first_name, last_name, username, email, password)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Registration failed");
                false
            })
    }

    pub async fn verify_credentials(&self, username: &str, password: &str) -> bool {
        users::verify_credentials(&self.db, username, password)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Credential check failed");
                false
            })
    }

    /// Rows read before any failure
    pub async fn fetch_all(&self) -> Vec<Person> {
        let (people, error) = users::fetch_all_lossy(&self.db).await;
        if let Some(e) = error {
            tracing::error!(error = %e, read = people.len(), "Fetching users failed");
        }
        people
    }

    /// Id of the inserted row, `None` on failure
    pub async fn add_person(&self, data: &shared::models::PersonCreate) -> Option<i64> {
        users::add_person(&self.db, data)
            .await
            .map_err(|e| tracing::error!(error = %e, "Adding record failed"))
            .ok()
    }

    pub async fn delete_person(&self, id: i64) -> bool {
        users::delete_person(&self.db, id)
            .await
            .map_err(|e| tracing::error!(error = %e, id, "Deleting record failed"))
            .is_ok()
    }
}
