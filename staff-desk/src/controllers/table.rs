use super::Feedback;
use crate::db::users;
use crate::state::AppState;
use crate::validation::{DEPARTMENTS, RecordForm};
use shared::error::ErrorCode;
use shared::models::Person;
use std::sync::Arc;

/// Record table of the main screen
pub struct TableController {
    state: Arc<AppState>,
}

impl TableController {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    pub fn departments(&self) -> &'static [&'static str] {
        &DEPARTMENTS
    }

    /// Every record in storage order
    pub async fn records(&self) -> Result<Vec<Person>, Feedback> {
        users::fetch_all(&self.state.db).await.map_err(|e| {
            tracing::error!(error = %e, "Loading records failed");
            Feedback::error(e.code(), format!("Error loading data: {e}"))
        })
    }

    pub async fn add_record(&self, form: RecordForm) -> Feedback {
        let data = match form.into_person() {
            Ok(data) => data,
            Err(e) => return Feedback::error(e.code(), e.to_string()),
        };

        match users::add_person(&self.state.db, &data).await {
            Ok(_) => Feedback::info("Record added successfully!"),
            Err(e) => {
                tracing::error!(username = %data.username, error = %e, "Adding record failed");
                Feedback::error(e.code(), format!("Error adding record: {e}"))
            }
        }
    }

    pub async fn delete_record(&self, selected: Option<&Person>) -> Feedback {
        let Some(id) = selected.and_then(|person| person.id) else {
            return Feedback::error(ErrorCode::RequiredField, "No record selected for deletion.");
        };

        match users::delete_person(&self.state.db, id).await {
            Ok(()) => Feedback::info("Record deleted successfully!"),
            Err(e) => {
                tracing::error!(id, error = %e, "Deleting record failed");
                Feedback::error(e.code(), format!("Error deleting record: {e}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::Level;
    use crate::state::test_support::temp_state;
    use rust_decimal::Decimal;

    fn form(username: &str, rating: &str) -> RecordForm {
        RecordForm {
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            username: username.to_string(),
            email: format!("{username}@navy.mil"),
            password: "cobol1959".to_string(),
            department: Some("IT".to_string()),
            performance_rating: rating.to_string(),
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_add_then_list_then_delete() {
        let (_dir, state) = temp_state();
        let controller = TableController::new(state);

        let feedback = controller.add_record(form("ghopper", "4.5")).await;
        assert_eq!(feedback, Feedback::info("Record added successfully!"));

        let records = controller.records().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].performance_rating, Some(Decimal::new(45, 1)));

        let feedback = controller.delete_record(records.first()).await;
        assert_eq!(feedback.message, "Record deleted successfully!");
        assert!(controller.records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_numeric_rating_is_rejected() {
        let (_dir, state) = temp_state();
        let controller = TableController::new(state);

        let feedback = controller.add_record(form("ghopper", "excellent")).await;
        assert_eq!(
            feedback,
            Feedback::error(ErrorCode::InvalidFormat, "Performance rating must be a number.")
        );
        assert!(controller.records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_rating_is_an_add_error() {
        let (_dir, state) = temp_state();
        let controller = TableController::new(state);

        let feedback = controller.add_record(form("ghopper", "150")).await;
        assert_eq!(feedback.level, Level::Error);
        assert_eq!(feedback.code, ErrorCode::ValidationFailed);
        assert!(feedback.message.starts_with("Error adding record: "));
    }

    #[tokio::test]
    async fn test_duplicate_record_is_an_add_error() {
        let (_dir, state) = temp_state();
        let controller = TableController::new(state);
        controller.add_record(form("ghopper", "4")).await;

        let feedback = controller.add_record(form("ghopper", "4")).await;
        assert!(feedback.is_error());
        assert!(feedback.message.starts_with("Error adding record: "));
    }

    #[tokio::test]
    async fn test_delete_without_selection() {
        let (_dir, state) = temp_state();
        let controller = TableController::new(state);

        let feedback = controller.delete_record(None).await;
        assert_eq!(
            feedback,
            Feedback::error(ErrorCode::RequiredField, "No record selected for deletion.")
        );

        let unsaved = Person::new("A", "B", "abcd", "a@b.co", "password1");
        let feedback = controller.delete_record(Some(&unsaved)).await;
        assert_eq!(feedback.message, "No record selected for deletion.");
    }

    #[tokio::test]
    async fn test_delete_missing_record_is_an_error() {
        let (_dir, state) = temp_state();
        let controller = TableController::new(state);

        let ghost = Person::with_id(99, "A", "B", "abcd", "a@b.co", "password1");
        let feedback = controller.delete_record(Some(&ghost)).await;
        assert!(feedback.message.starts_with("Error deleting record: "));
        assert_eq!(feedback.code, ErrorCode::PersonNotFound);
    }

    #[tokio::test]
    async fn test_departments() {
        let (_dir, state) = temp_state();
        let controller = TableController::new(state);
        assert_eq!(
            controller.departments(),
            &["HR", "IT", "Finance", "Marketing", "Operations"]
        );
    }
}
