use async_trait::async_trait;
use tracing::info;
use validator::Validate;

use emo_cat_guide_data::models::psychology_test::NewPsychologyTest;
use emo_cat_guide_data::repository::PsychologyTestRepositoryTrait;

use crate::entities::conversions::convert_to_domain_psychology_test;
use crate::entities::{PsychologyTest, SubmitPsychologyTestRequest};
use crate::services::errors::{validation_message, ServiceError};

/// Message returned when an answer is missing
pub const ANSWER_ALL_QUESTIONS: &str = "Please answer all questions";

/// Emo Guide questionnaire operations
#[async_trait]
pub trait PsychologyTestServiceTrait {
    /// Store a questionnaire. Both answers are required.
    async fn submit(&self, user_id: &str, request: SubmitPsychologyTestRequest) -> Result<PsychologyTest, ServiceError>;

    /// Questionnaires of a user, newest first
    async fn list(&self, user_id: &str) -> Result<Vec<PsychologyTest>, ServiceError>;
}

pub struct PsychologyTestService<R: PsychologyTestRepositoryTrait> {
    repository: R,
}

impl<R: PsychologyTestRepositoryTrait> PsychologyTestService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<R: PsychologyTestRepositoryTrait + Send + Sync> PsychologyTestServiceTrait for PsychologyTestService<R> {
    async fn submit(&self, user_id: &str, request: SubmitPsychologyTestRequest) -> Result<PsychologyTest, ServiceError> {
        let request = SubmitPsychologyTestRequest {
            question1: request.question1.trim().to_string(),
            question2: request.question2.trim().to_string(),
        };

        if request.question1.is_empty() || request.question2.is_empty() {
            return Err(ServiceError::Validation(ANSWER_ALL_QUESTIONS.to_string()));
        }
        if let Err(errors) = request.validate() {
            return Err(ServiceError::Validation(validation_message(&errors)));
        }

        let record = self.repository.create(NewPsychologyTest {
            user_id: user_id.to_string(),
            question1: request.question1,
            question2: request.question2,
        }).await?;

        info!("Psychology test {} submitted by user {}", record.id, user_id);
        Ok(convert_to_domain_psychology_test(record))
    }

    async fn list(&self, user_id: &str) -> Result<Vec<PsychologyTest>, ServiceError> {
        let records = self.repository.list_by_user(user_id).await?;
        Ok(records.into_iter().map(convert_to_domain_psychology_test).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emo_cat_guide_data::repository::PsychologyTestRepository;

    fn answers(q1: &str, q2: &str) -> SubmitPsychologyTestRequest {
        SubmitPsychologyTestRequest { question1: q1.to_string(), question2: q2.to_string() }
    }

    #[tokio::test]
    async fn test_submit_and_list() {
        let service = PsychologyTestService::new(PsychologyTestRepository::new());

        let test = service.submit("u1", answers("  a bit tired ", "a nap")).await.unwrap();
        assert_eq!(test.question1, "a bit tired");
        assert_eq!(test.question2, "a nap");
        assert!(!test.submit_time.is_empty());

        let tests = service.list("u1").await.unwrap();
        assert_eq!(tests.len(), 1);
        assert!(service.list("u2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_both_answers_required() {
        let service = PsychologyTestService::new(PsychologyTestRepository::new());

        for request in [answers("", "x"), answers("x", "   ")] {
            let result = service.submit("u1", request).await;
            assert!(matches!(result, Err(ServiceError::Validation(msg)) if msg == ANSWER_ALL_QUESTIONS));
        }
        assert!(service.list("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_answers_have_a_length_limit() {
        let service = PsychologyTestService::new(PsychologyTestRepository::new());
        let result = service.submit("u1", answers(&"z".repeat(501), "ok")).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }
}
