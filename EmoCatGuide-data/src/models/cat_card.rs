use serde::{Deserialize, Serialize};

/// Storage model for a generated cat companion card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatCardRecord {
    /// Unique identifier for the card
    pub id: String,

    /// Owner of the card
    pub user_id: String,

    /// Companion identifier (e.g. "orange_tabby")
    pub cat: String,

    /// Card title
    pub title: String,

    /// Companion illustration URL
    pub image_url: String,

    /// Personalized feedback message
    pub feedback: String,

    /// Mood derived from the questionnaire
    pub mood: String,

    /// Health score the card was generated from, if the report was analyzed
    pub health_score: Option<u8>,

    /// RFC 3339 creation timestamp
    pub created_at: String,
}

/// Input data for recording a generated card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCatCard {
    pub user_id: String,
    pub cat: String,
    pub title: String,
    pub image_url: String,
    pub feedback: String,
    pub mood: String,
    pub health_score: Option<u8>,
}
