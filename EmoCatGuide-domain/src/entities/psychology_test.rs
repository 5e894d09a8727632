use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Submitted Emo Guide questionnaire
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PsychologyTest {
    pub id: String,
    pub user_id: String,

    /// How the user feels right now
    pub question1: String,

    /// What would help the user right now
    pub question2: String,

    pub submit_time: String,
}

/// Request payload for submitting the questionnaire
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SubmitPsychologyTestRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 500, message = "question1 must be answered"))]
    pub question1: String,

    #[serde(default)]
    #[validate(length(min = 1, max = 500, message = "question2 must be answered"))]
    pub question2: String,
}
