use serde::{Deserialize, Serialize};

/// Storage model for a submitted Emo Guide questionnaire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PsychologyTestRecord {
    /// Unique identifier for the submission
    pub id: String,

    /// Owner of the submission
    pub user_id: String,

    /// Answer to the first question (current mood)
    pub question1: String,

    /// Answer to the second question (what would help right now)
    pub question2: String,

    /// RFC 3339 submission timestamp
    pub submit_time: String,
}

/// Input data for recording a questionnaire submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPsychologyTest {
    pub user_id: String,
    pub question1: String,
    pub question2: String,
}
