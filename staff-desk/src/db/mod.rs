//! Database Module
//!
//! Owns the SQLite connection pool, schema bootstrap and the error type shared
//! by every data access function.

pub mod compat;
pub mod password;
pub mod users;

use crate::config::{DatabaseConfig, PasswordPolicy};
use shared::error::ErrorCode;
use sqlx::error::ErrorKind;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Sqlite, SqlitePool};
use std::time::Duration;
use thiserror::Error;

/// `users` table definition. SQLite maps the declared column types onto its
/// storage classes.
pub const CREATE_USERS_TABLE: &str = "CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name VARCHAR(100) NOT NULL,
    last_name VARCHAR(100) NOT NULL,
    username VARCHAR(150) UNIQUE NOT NULL,
    password VARCHAR(200) NOT NULL,
    department VARCHAR(100),
    performance_rating DECIMAL(4,2),
    email VARCHAR(200) UNIQUE NOT NULL,
    image_url TEXT
)";

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {1}")]
    ConstraintViolation(ErrorCode, String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Unknown(String),
}

impl RepoError {
    /// Unified error code for this failure
    pub fn code(&self) -> ErrorCode {
        match self {
            RepoError::NotFound(_) => ErrorCode::PersonNotFound,
            RepoError::ConstraintViolation(code, _) => *code,
            RepoError::Connection(_) => ErrorCode::ConnectionFailed,
            RepoError::Validation(_) => ErrorCode::ValidationFailed,
            RepoError::Unknown(_) => ErrorCode::DatabaseError,
        }
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, RepoError::Connection(_))
    }
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => RepoError::NotFound(err.to_string()),
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.kind() {
                    ErrorKind::UniqueViolation => {
                        RepoError::ConstraintViolation(unique_violation_code(&message), message)
                    }
                    ErrorKind::ForeignKeyViolation
                    | ErrorKind::NotNullViolation
                    | ErrorKind::CheckViolation => {
                        RepoError::ConstraintViolation(ErrorCode::ConstraintViolation, message)
                    }
                    _ => RepoError::Unknown(message),
                }
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::Configuration(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => RepoError::Connection(err.to_string()),
            _ => RepoError::Unknown(err.to_string()),
        }
    }
}

impl From<password::PasswordError> for RepoError {
    fn from(err: password::PasswordError) -> Self {
        RepoError::Unknown(err.to_string())
    }
}

/// SQLite reports `UNIQUE constraint failed: users.<column>`
fn unique_violation_code(message: &str) -> ErrorCode {
    if message.contains("users.username") {
        ErrorCode::UsernameExists
    } else if message.contains("users.email") {
        ErrorCode::EmailExists
    } else {
        ErrorCode::ConstraintViolation
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Database service owning a lazily connecting SQLite pool.
///
/// Connections are handed out per operation and go back to the pool when the
/// guard drops, whichever way the operation ends.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    config: DatabaseConfig,
    password_policy: PasswordPolicy,
}

impl Database {
    /// Build the pool. No connection is opened until the first operation.
    pub fn new(config: &DatabaseConfig, password_policy: PasswordPolicy) -> Self {
        let options = SqliteConnectOptions::new()
            .filename(config.database_path())
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_lazy_with(options);

        if config.username.is_some() || config.password.is_some() {
            tracing::warn!(
                "Database username/password are set but the embedded engine does not authenticate; ignoring"
            );
        }

        tracing::debug!(
            path = %config.database_path().display(),
            policy = ?password_policy,
            "Database pool configured"
        );

        Self {
            pool,
            config: config.clone(),
            password_policy,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn password_policy(&self) -> PasswordPolicy {
        self.password_policy
    }

    /// Scoped connection for a single statement or short sequence.
    pub async fn open_connection(&self) -> RepoResult<PoolConnection<Sqlite>> {
        self.pool.acquire().await.map_err(RepoError::from)
    }

    /// Create the database and the `users` table when absent.
    ///
    /// Returns `true` when at least one user is already registered.
    pub async fn ensure_schema(&self) -> RepoResult<bool> {
        // Server level: the data directory stands in for the database server
        let data_dir = self.config.data_dir();
        tokio::fs::create_dir_all(&data_dir).await.map_err(|e| {
            RepoError::Connection(format!(
                "Failed to create data directory {}: {e}",
                data_dir.display()
            ))
        })?;

        // Database level: the file is created on first connect
        let mut conn = self.open_connection().await?;
        sqlx::query(CREATE_USERS_TABLE).execute(&mut *conn).await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *conn)
            .await?;
        Ok(count > 0)
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
