//! Users Repository
//!
//! Every public operation bootstraps the schema first, then works on a
//! connection scoped to that operation.

use super::password::{self, Verification};
use super::{Database, RepoError, RepoResult};
use crate::config::PasswordPolicy;
use futures::TryStreamExt;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use shared::error::ErrorCode;
use shared::models::{Person, PersonCreate, PersonRow};
use sqlx::SqliteConnection;

const SELECT_PERSON: &str = "SELECT id, first_name, last_name, username, password, department, \
     CAST(performance_rating AS REAL) AS performance_rating, email, image_url FROM users";

/// Largest magnitude a DECIMAL(4,2) column holds
const MAX_RATING: Decimal = Decimal::from_parts(9999, 0, 0, false, 2);

/// Read every person in storage order, stopping at the first failure.
///
/// Returns the rows collected so far together with the error, if any.
pub async fn fetch_all_lossy(db: &Database) -> (Vec<Person>, Option<RepoError>) {
    let mut people = Vec::new();

    if let Err(e) = db.ensure_schema().await {
        return (people, Some(e));
    }
    let mut conn = match db.open_connection().await {
        Ok(conn) => conn,
        Err(e) => return (people, Some(e)),
    };

    let mut rows = sqlx::query_as::<_, PersonRow>(SELECT_PERSON).fetch(&mut *conn);
    loop {
        match rows.try_next().await {
            Ok(Some(row)) => people.push(row.into()),
            Ok(None) => return (people, None),
            Err(e) => return (people, Some(e.into())),
        }
    }
}

/// Read every person in storage order
pub async fn fetch_all(db: &Database) -> RepoResult<Vec<Person>> {
    match fetch_all_lossy(db).await {
        (people, None) => Ok(people),
        (_, Some(e)) => Err(e),
    }
}

/// Find a person by id
pub async fn find_by_id(db: &Database, id: i64) -> RepoResult<Option<Person>> {
    db.ensure_schema().await?;
    let person = sqlx::query_as::<_, PersonRow>(&format!("{SELECT_PERSON} WHERE id = ?"))
        .bind(id)
        .fetch_optional(db.pool())
        .await?;
    Ok(person.map(Person::from))
}

/// Number of registered users
pub async fn count_users(db: &Database) -> RepoResult<i64> {
    db.ensure_schema().await?;
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(db.pool())
        .await?;
    Ok(count)
}

pub async fn username_exists(db: &Database, username: &str) -> RepoResult<bool> {
    db.ensure_schema().await?;
    let mut conn = db.open_connection().await?;
    username_taken(&mut conn, username).await
}

pub async fn email_exists(db: &Database, email: &str) -> RepoResult<bool> {
    db.ensure_schema().await?;
    let mut conn = db.open_connection().await?;
    email_taken(&mut conn, email).await
}

async fn username_taken(conn: &mut SqliteConnection, username: &str) -> RepoResult<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?")
        .bind(username)
        .fetch_one(&mut *conn)
        .await?;
    Ok(count > 0)
}

async fn email_taken(conn: &mut SqliteConnection, email: &str) -> RepoResult<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?")
        .bind(email)
        .fetch_one(&mut *conn)
        .await?;
    Ok(count > 0)
}

/// Register a new user.
///
/// Returns `Ok(false)` when the username or email is already taken, either by
/// the pre-check or by the UNIQUE constraint when a concurrent registration
/// won the race.
pub async fn register(
    db: &Database,
    first_name: &str,
    last_name: &str,
    username: &str,
    email: &str,
    password: &str,
) -> RepoResult<bool> {
    db.ensure_schema().await?;

    let mut conn = db.open_connection().await?;
    if email_taken(&mut conn, email).await? || username_taken(&mut conn, username).await? {
        tracing::info!(username = %username, "Registration rejected: username or email taken");
        return Ok(false);
    }

    let stored = password::hash_for_storage(password, db.password_policy())?;
    let result = sqlx::query(
        "INSERT INTO users (first_name, last_name, username, email, password) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(first_name)
    .bind(last_name)
    .bind(username)
    .bind(email)
    .bind(&stored)
    .execute(&mut *conn)
    .await;

    match result {
        Ok(done) => {
            let inserted = done.rows_affected() == 1;
            if inserted {
                tracing::info!(username = %username, "User registered");
            }
            Ok(inserted)
        }
        Err(e) => match RepoError::from(e) {
            RepoError::ConstraintViolation(code, message)
                if matches!(code, ErrorCode::UsernameExists | ErrorCode::EmailExists) =>
            {
                tracing::warn!(username = %username, %message, "Registration lost a uniqueness race");
                Ok(false)
            }
            other => Err(other),
        },
    }
}

/// Check a username/password pair.
///
/// Legacy plaintext rows are re-hashed after a successful check when the
/// policy asks for Argon2.
pub async fn verify_credentials(db: &Database, username: &str, password: &str) -> RepoResult<bool> {
    db.ensure_schema().await?;

    let row: Option<(i64, String)> =
        sqlx::query_as("SELECT id, password FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(db.pool())
            .await?;
    let Some((id, stored)) = row else {
        tracing::debug!(username = %username, "Unknown username");
        return Ok(false);
    };

    let verification = password::verify_password(password, &stored);
    if verification == Verification::LegacyMatch && db.password_policy() == PasswordPolicy::Argon2 {
        if let Err(e) = upgrade_password(db, id, password).await {
            tracing::warn!(username = %username, error = %e, "Failed to re-hash legacy password");
        }
    }
    Ok(verification.is_match())
}

async fn upgrade_password(db: &Database, id: i64, password: &str) -> RepoResult<()> {
    let hashed = password::hash_password(password)?;
    sqlx::query("UPDATE users SET password = ? WHERE id = ?")
        .bind(hashed)
        .bind(id)
        .execute(db.pool())
        .await?;
    tracing::info!(id, "Legacy plaintext password re-hashed");
    Ok(())
}

/// Add a record from the table view. Returns the new id.
pub async fn add_person(db: &Database, data: &PersonCreate) -> RepoResult<i64> {
    if let Some(rating) = data.performance_rating {
        validate_rating(rating)?;
    }
    db.ensure_schema().await?;

    let mut conn = db.open_connection().await?;
    if username_taken(&mut conn, &data.username).await? {
        return Err(RepoError::ConstraintViolation(
            ErrorCode::UsernameExists,
            format!("Username '{}' already exists", data.username),
        ));
    }
    if email_taken(&mut conn, &data.email).await? {
        return Err(RepoError::ConstraintViolation(
            ErrorCode::EmailExists,
            format!("Email '{}' already exists", data.email),
        ));
    }

    let stored = password::hash_for_storage(&data.password, db.password_policy())?;
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO users (first_name, last_name, username, email, password, department, performance_rating, image_url) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(&data.first_name)
    .bind(&data.last_name)
    .bind(&data.username)
    .bind(&data.email)
    .bind(&stored)
    .bind(&data.department)
    .bind(data.performance_rating.and_then(|r| r.to_f64()))
    .bind(&data.image_url)
    .fetch_one(&mut *conn)
    .await?;

    tracing::info!(id, username = %data.username, "Record added");
    Ok(id)
}

/// Delete a record by id
pub async fn delete_person(db: &Database, id: i64) -> RepoResult<()> {
    db.ensure_schema().await?;

    let mut conn = db.open_connection().await?;
    let done = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if done.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Person {id} not found")));
    }
    tracing::info!(id, "Record deleted");
    Ok(())
}

/// DECIMAL(4,2): at most two fractional digits and |rating| < 100
pub fn validate_rating(rating: Decimal) -> RepoResult<()> {
    if rating.abs() > MAX_RATING {
        return Err(RepoError::Validation(format!(
            "Performance rating {rating} is out of range (max {MAX_RATING})"
        )));
    }
    if rating.normalize().scale() > 2 {
        return Err(RepoError::Validation(format!(
            "Performance rating {rating} has more than two decimal places"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::temp_database;

    fn record(username: &str, email: &str) -> PersonCreate {
        PersonCreate {
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password: "compiler1".to_string(),
            department: Some("IT".to_string()),
            performance_rating: Some(Decimal::new(475, 2)),
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_register_then_exists() {
        let (_dir, db) = temp_database(PasswordPolicy::Plaintext);

        assert!(!username_exists(&db, "ada").await.unwrap());
        assert!(register(&db, "Ada", "Lovelace", "ada", "ada@x.com", "password1").await.unwrap());
        assert!(username_exists(&db, "ada").await.unwrap());
        assert!(email_exists(&db, "ada@x.com").await.unwrap());
        assert!(!email_exists(&db, "other@x.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates_without_inserting() {
        let (_dir, db) = temp_database(PasswordPolicy::Plaintext);
        assert!(register(&db, "Ada", "Lovelace", "ada", "ada@x.com", "password1").await.unwrap());

        assert!(!register(&db, "Ada", "L", "ada", "new@x.com", "password1").await.unwrap());
        assert!(!register(&db, "Ada", "L", "ada2", "ada@x.com", "password1").await.unwrap());
        assert_eq!(count_users(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_register_leaves_optional_columns_null() {
        let (_dir, db) = temp_database(PasswordPolicy::Plaintext);
        register(&db, "Ada", "Lovelace", "ada", "ada@x.com", "password1").await.unwrap();

        let people = fetch_all(&db).await.unwrap();
        assert_eq!(people.len(), 1);
        let ada = &people[0];
        assert!(ada.id.is_some());
        assert_eq!(ada.department, None);
        assert_eq!(ada.performance_rating, None);
        assert_eq!(ada.image_url, None);
        // Legacy policy keeps the value verbatim
        assert_eq!(ada.password, "password1");
    }

    #[tokio::test]
    async fn test_argon2_policy_hashes_at_rest() {
        let (_dir, db) = temp_database(PasswordPolicy::Argon2);
        register(&db, "Ada", "Lovelace", "ada", "ada@x.com", "password1").await.unwrap();

        let stored: String = sqlx::query_scalar("SELECT password FROM users WHERE username = 'ada'")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert!(password::is_hashed(&stored));

        assert!(verify_credentials(&db, "ada", "password1").await.unwrap());
        assert!(!verify_credentials(&db, "ada", "wrong").await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_credentials_exact_match() {
        let (_dir, db) = temp_database(PasswordPolicy::Plaintext);
        register(&db, "Ada", "Lovelace", "ada", "ada@x.com", "password1").await.unwrap();

        assert!(verify_credentials(&db, "ada", "password1").await.unwrap());
        assert!(!verify_credentials(&db, "ada", "Password1").await.unwrap());
        assert!(!verify_credentials(&db, "ada", "password1 ").await.unwrap());
        assert!(!verify_credentials(&db, "nobody", "password1").await.unwrap());
    }

    #[tokio::test]
    async fn test_legacy_row_is_upgraded_on_login() {
        let (_dir, db) = temp_database(PasswordPolicy::Argon2);
        db.ensure_schema().await.unwrap();
        sqlx::query(
            "INSERT INTO users (first_name, last_name, username, email, password) VALUES ('Old', 'Row', 'legacy', 'l@x.com', 'plainpass')",
        )
        .execute(db.pool())
        .await
        .unwrap();

        assert!(verify_credentials(&db, "legacy", "plainpass").await.unwrap());

        let stored: String =
            sqlx::query_scalar("SELECT password FROM users WHERE username = 'legacy'")
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert!(password::is_hashed(&stored));
        assert!(verify_credentials(&db, "legacy", "plainpass").await.unwrap());
    }

    #[tokio::test]
    async fn test_add_and_delete_person() {
        let (_dir, db) = temp_database(PasswordPolicy::Plaintext);

        let id = add_person(&db, &record("grace", "grace@x.com")).await.unwrap();
        let stored = find_by_id(&db, id).await.unwrap().unwrap();
        assert_eq!(stored.department.as_deref(), Some("IT"));
        assert_eq!(stored.performance_rating, Some(Decimal::new(475, 2)));

        delete_person(&db, id).await.unwrap();
        assert!(find_by_id(&db, id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_whole_number_rating_reads_back() {
        let (_dir, db) = temp_database(PasswordPolicy::Plaintext);
        let mut data = record("grace", "grace@x.com");
        data.performance_rating = Some(Decimal::new(4, 0));

        let id = add_person(&db, &data).await.unwrap();
        let stored = find_by_id(&db, id).await.unwrap().unwrap();
        assert_eq!(stored.performance_rating, Some(Decimal::new(4, 0)));
    }

    #[tokio::test]
    async fn test_add_person_duplicate_email_is_constraint_violation() {
        let (_dir, db) = temp_database(PasswordPolicy::Plaintext);
        add_person(&db, &record("grace", "grace@x.com")).await.unwrap();

        let err = add_person(&db, &record("grace2", "grace@x.com")).await.unwrap_err();
        assert!(matches!(err, RepoError::ConstraintViolation(ErrorCode::EmailExists, _)));

        let err = add_person(&db, &record("grace", "other@x.com")).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::UsernameExists);
    }

    #[tokio::test]
    async fn test_delete_missing_person_is_not_found() {
        let (_dir, db) = temp_database(PasswordPolicy::Plaintext);
        let err = delete_person(&db, 404).await.unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_fetch_all_counts_registrations_minus_deletions() {
        let (_dir, db) = temp_database(PasswordPolicy::Plaintext);
        for i in 0..5 {
            let username = format!("user{i}");
            let email = format!("user{i}@x.com");
            assert!(register(&db, "First", "Last", &username, &email, "password1").await.unwrap());
        }

        let people = fetch_all(&db).await.unwrap();
        for person in people.iter().take(2) {
            delete_person(&db, person.id.unwrap()).await.unwrap();
        }

        let remaining = fetch_all(&db).await.unwrap();
        assert_eq!(remaining.len(), 3);
        for person in &remaining {
            assert_eq!(person.first_name, "First");
            assert_eq!(person.last_name, "Last");
            assert!(person.username.starts_with("user"));
            assert_eq!(person.email, format!("{}@x.com", person.username));
        }
    }

    #[tokio::test]
    async fn test_concurrent_registrations_admit_one_winner() {
        let (_dir, db) = temp_database(PasswordPolicy::Plaintext);
        db.ensure_schema().await.unwrap();

        let mut handles = Vec::new();
        for i in 0..4 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                register(&db, "Ada", "Lovelace", "ada", &format!("ada{i}@x.com"), "password1").await
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(count_users(&db).await.unwrap(), 1);
    }

    #[test]
    fn test_validate_rating() {
        assert!(validate_rating(Decimal::new(9999, 2)).is_ok());
        assert!(validate_rating(Decimal::new(-350, 2)).is_ok());
        assert!(validate_rating(Decimal::new(10000, 2)).is_err());
        assert!(validate_rating(Decimal::new(4751, 3)).is_err());
        // Trailing zeros do not count as precision
        assert!(validate_rating(Decimal::new(4500, 3)).is_ok());
    }
}
