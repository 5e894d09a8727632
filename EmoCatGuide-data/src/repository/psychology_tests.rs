use chrono::{SecondsFormat, Utc};
use tracing::{debug, error};
use uuid::Uuid;
use async_trait::async_trait;

use crate::models::psychology_test::{NewPsychologyTest, PsychologyTestRecord};
use crate::database::get_db_pool;
use super::errors::RepositoryError;
use super::in_memory::InMemoryStorage;
use super::storage::DatabaseStorage;

/// Repository trait for Emo Guide questionnaire submissions
#[async_trait]
pub trait PsychologyTestRepositoryTrait {
    /// Record a submission, stamping the submit time
    async fn create(&self, test: NewPsychologyTest) -> Result<PsychologyTestRecord, RepositoryError>;

    /// All submissions of a user, newest first
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<PsychologyTestRecord>, RepositoryError>;
}

/// Repository for questionnaire submissions
#[derive(Debug, Clone, Default)]
pub struct PsychologyTestRepository {
    storage: InMemoryStorage,
}

impl PsychologyTestRepository {
    /// Create a new repository
    pub fn new() -> Self {
        Self {
            storage: InMemoryStorage::new(),
        }
    }
}

#[async_trait]
impl PsychologyTestRepositoryTrait for PsychologyTestRepository {
    async fn create(&self, test: NewPsychologyTest) -> Result<PsychologyTestRecord, RepositoryError> {
        let record = PsychologyTestRecord {
            id: Uuid::new_v4().to_string(),
            user_id: test.user_id,
            question1: test.question1,
            question2: test.question2,
            submit_time: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        };

        match get_db_pool() {
            Ok(pool) => {
                debug!("Storing psychology test in database: {}", record.id);
                match DatabaseStorage::store_psychology_test(&pool, &record).await {
                    Ok(_) => Ok(record),
                    Err(e) => {
                        error!("Failed to store psychology test in database: {}", e);
                        self.storage.store_psychology_test(&record).await
                    }
                }
            },
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage", e);
                self.storage.store_psychology_test(&record).await
            }
        }
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<PsychologyTestRecord>, RepositoryError> {
        match get_db_pool() {
            Ok(pool) => {
                match DatabaseStorage::list_psychology_tests(&pool, user_id).await {
                    Ok(tests) => Ok(tests),
                    Err(e) => {
                        error!("Failed to list psychology tests from database: {}", e);
                        self.storage.list_psychology_tests(user_id).await
                    }
                }
            },
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage for list_by_user", e);
                self.storage.list_psychology_tests(user_id).await
            }
        }
    }
}
