// Repository module structure
pub mod errors;
mod in_memory;
mod storage;
mod users;
mod health_reports;
mod psychology_tests;
mod cat_cards;

// Re-export commonly used types
pub use errors::RepositoryError;
pub use users::{UserRepository, UserRepositoryTrait};
pub use health_reports::{HealthReportRepository, HealthReportRepositoryTrait};
pub use psychology_tests::{PsychologyTestRepository, PsychologyTestRepositoryTrait};
pub use cat_cards::{CatCardRepository, CatCardRepositoryTrait};

/// Test doubles, available for tests and when the mock feature is enabled
#[cfg(any(test, feature = "mock"))]
pub mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::database::DatabaseError;
    use crate::models::cat_card::{CatCardRecord, NewCatCard};
    use crate::models::health_report::{HealthReportRecord, NewHealthReport};
    use crate::models::psychology_test::{NewPsychologyTest, PsychologyTestRecord};
    use crate::models::user::{NewUser, UserRecord};

    /// Repository whose every operation fails with a database error
    #[derive(Debug, Clone, Default)]
    pub struct FailingRepository;

    fn failure() -> RepositoryError {
        RepositoryError::Database(DatabaseError::GenericError("storage offline".to_string()))
    }

    #[async_trait]
    impl UserRepositoryTrait for FailingRepository {
        async fn create(&self, _new_user: NewUser) -> Result<UserRecord, RepositoryError> {
            Err(failure())
        }

        async fn get_by_email(&self, _email: &str) -> Result<Option<UserRecord>, RepositoryError> {
            Err(failure())
        }

        async fn get_by_id(&self, _id: &str) -> Result<Option<UserRecord>, RepositoryError> {
            Err(failure())
        }

        async fn update_last_login(&self, _id: &str) -> Result<(), RepositoryError> {
            Err(failure())
        }
    }

    #[async_trait]
    impl HealthReportRepositoryTrait for FailingRepository {
        async fn create(&self, _report: NewHealthReport) -> Result<HealthReportRecord, RepositoryError> {
            Err(failure())
        }

        async fn list_by_user(&self, _user_id: &str) -> Result<Vec<HealthReportRecord>, RepositoryError> {
            Err(failure())
        }

        async fn get_by_id(&self, _id: &str) -> Result<Option<HealthReportRecord>, RepositoryError> {
            Err(failure())
        }
    }

    #[async_trait]
    impl PsychologyTestRepositoryTrait for FailingRepository {
        async fn create(&self, _test: NewPsychologyTest) -> Result<PsychologyTestRecord, RepositoryError> {
            Err(failure())
        }

        async fn list_by_user(&self, _user_id: &str) -> Result<Vec<PsychologyTestRecord>, RepositoryError> {
            Err(failure())
        }
    }

    #[async_trait]
    impl CatCardRepositoryTrait for FailingRepository {
        async fn create(&self, _card: NewCatCard) -> Result<CatCardRecord, RepositoryError> {
            Err(failure())
        }

        async fn list_by_user(&self, _user_id: &str) -> Result<Vec<CatCardRecord>, RepositoryError> {
            Err(failure())
        }
    }
}
