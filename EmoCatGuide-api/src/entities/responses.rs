use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use emo_cat_guide_domain::entities::{CatCard, HealthReport, PsychologyTest};

/// Next step after a report upload
pub const NEXT_PSYCHOLOGY_TEST: &str = "psychology_test";

/// Next step after the questionnaire
pub const NEXT_GENERATE_CARD: &str = "generate_card";

/// Response for an accepted report upload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReportUploadResponse {
    pub message: String,
    pub report: HealthReport,
    /// Where the client should go next
    pub next_step: String,
}

/// Response for a stored questionnaire
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PsychologyTestResponse {
    pub message: String,
    pub test: PsychologyTest,
    /// Where the client should go next
    pub next_step: String,
}

/// Response for a generated cat card
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CatCardResponse {
    pub message: String,
    pub card: CatCard,
}
