//! End-to-end flows through the controllers and the data layer.

use staff_desk::config::{Config, DatabaseConfig, PasswordPolicy};
use staff_desk::controllers::{
    Feedback, LoginController, Screen, SignUpController, TableController,
};
use staff_desk::db::compat::LegacyUsers;
use staff_desk::db::users;
use staff_desk::validation::{RecordForm, SignUpForm};
use shared::error::ErrorCode;
use staff_desk::AppState;
use std::sync::Arc;
use tempfile::TempDir;

fn config(dir: &TempDir, policy: PasswordPolicy) -> Config {
    Config {
        database: DatabaseConfig {
            server_url: format!("sqlite://{}", dir.path().join("db").display()),
            database_name: "staff_flow".to_string(),
            ..Default::default()
        },
        password_policy: policy,
        prefs_dir: dir.path().join("prefs"),
        log_dir: None,
        ..Default::default()
    }
}

fn state(dir: &TempDir) -> Arc<AppState> {
    AppState::new(config(dir, PasswordPolicy::Plaintext))
}

fn sign_up_form(username: &str) -> SignUpForm {
    SignUpForm {
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password: "password123".to_string(),
    }
}

#[tokio::test]
async fn first_start_creates_schema_without_users() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(&dir);

    assert!(!state.db.ensure_schema().await.unwrap());
    assert!(state.db.config().database_path().exists());
    assert!(!state.db.ensure_schema().await.unwrap());
}

#[tokio::test]
async fn sign_up_then_log_in_reaches_main_screen() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(&dir);

    let feedback = SignUpController::new(state.clone())
        .sign_up(&sign_up_form("flow_user"))
        .await;
    assert_eq!(feedback.next, Some(Screen::Login));

    let login = LoginController::new(state.clone());
    let feedback = login.login("flow_user", "password123").await;
    assert_eq!(feedback.next, Some(Screen::Main));
    assert_eq!(
        state.sessions.current().unwrap().to_string(),
        "UserSession {username='flow_user', role='USER'}"
    );

    let feedback = login.logout();
    assert_eq!(feedback.next, Some(Screen::Login));
    assert_eq!(state.sessions.remembered_credentials().unwrap(), None);
}

#[tokio::test]
async fn second_sign_up_with_same_username_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(&dir);
    let controller = SignUpController::new(state.clone());

    controller.sign_up(&sign_up_form("dupe_user")).await;
    let mut again = sign_up_form("dupe_user");
    again.email = "fresh@example.com".to_string();

    let feedback = controller.sign_up(&again).await;
    assert_eq!(
        feedback,
        Feedback::error(
            ErrorCode::UsernameExists,
            "Username already exists. Please choose another."
        )
    );
    assert_eq!(users::count_users(&state.db).await.unwrap(), 1);
}

#[tokio::test]
async fn registrations_minus_deletions_remain() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(&dir);
    let signup = SignUpController::new(state.clone());
    let table = TableController::new(state.clone());

    for i in 0..6 {
        let feedback = signup.sign_up(&sign_up_form(&format!("member_{i}"))).await;
        assert!(!feedback.is_error(), "{feedback}");
    }

    let records = table.records().await.unwrap();
    assert_eq!(records.len(), 6);
    for person in records.iter().step_by(2) {
        let feedback = table.delete_record(Some(person)).await;
        assert_eq!(feedback.message, "Record deleted successfully!");
    }

    let remaining = table.records().await.unwrap();
    assert_eq!(remaining.len(), 3);
    assert!(remaining.iter().all(|p| p.first_name == "Test" && p.last_name == "User"));
}

#[tokio::test]
async fn added_record_is_listed_with_its_rating() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(&dir);
    let table = TableController::new(state.clone());

    let form = RecordForm {
        first_name: "Grace".to_string(),
        last_name: "Hopper".to_string(),
        username: "ghopper".to_string(),
        email: "grace@navy.mil".to_string(),
        password: "cobol1959".to_string(),
        department: Some("Operations".to_string()),
        performance_rating: "3.25".to_string(),
        image_url: Some("https://example.com/grace.png".to_string()),
    };
    assert_eq!(
        table.add_record(form).await,
        Feedback::info("Record added successfully!")
    );

    let records = table.records().await.unwrap();
    let grace = &records[0];
    assert_eq!(grace.full_name(), "Grace Hopper");
    assert_eq!(grace.department.as_deref(), Some("Operations"));
    assert_eq!(
        grace.performance_rating,
        Some(rust_decimal::Decimal::new(325, 2))
    );
    assert!(grace.to_string().contains("First Name='Grace'"));
}

#[tokio::test]
async fn remembered_login_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let state = state(&dir);
        SignUpController::new(state.clone())
            .sign_up(&sign_up_form("sticky_user"))
            .await;
        state.db.close().await;
    }

    let restarted = state(&dir);
    assert!(restarted.sessions.current().is_none());
    let session = LoginController::new(restarted.clone())
        .resume()
        .await
        .expect("remembered credentials resume the session");
    assert_eq!(session.username(), "sticky_user");
}

#[tokio::test]
async fn argon2_accounts_log_in() {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::new(config(&dir, PasswordPolicy::Argon2));

    SignUpController::new(state.clone())
        .sign_up(&sign_up_form("hashed_user"))
        .await;

    let people = users::fetch_all(&state.db).await.unwrap();
    assert_ne!(people[0].password, "password123");

    let login = LoginController::new(state.clone());
    assert_eq!(
        login.login("hashed_user", "password123").await.next,
        Some(Screen::Main)
    );
    let rejected = login.login("hashed_user", "password124").await;
    assert_eq!(rejected.code, ErrorCode::InvalidCredentials);
    assert_eq!(rejected.exit_status(), 2);
}

#[tokio::test]
async fn legacy_adapter_sees_the_same_rows() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(&dir);
    let legacy = LegacyUsers::new(state.db.clone());

    assert!(legacy.register("Old", "Caller", "old_caller", "old@example.com", "password1").await);
    assert!(legacy.email_exists("old@example.com").await);

    let feedback = LoginController::new(state.clone())
        .login("old_caller", "password1")
        .await;
    assert_eq!(feedback.next, Some(Screen::Main));
    assert_eq!(legacy.fetch_all().await.len(), 1);
}
