use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A companion from the nine-grid catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct FeaturedCat {
    /// Stable identifier (e.g. "orange_tabby")
    pub id: String,
    pub name: String,
    pub personality: String,
    pub image_url: String,
}

/// Mood derived from the questionnaire answers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Calm,
    Tired,
    Anxious,
    Sad,
    Neutral,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Calm => "calm",
            Mood::Tired => "tired",
            Mood::Anxious => "anxious",
            Mood::Sad => "sad",
            Mood::Neutral => "neutral",
        }
    }
}

/// Generated cat companion card
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CatCard {
    pub id: String,
    pub user_id: String,

    /// Companion identifier from the catalog
    pub cat: String,

    pub title: String,
    pub image_url: String,

    /// Personalized feedback message
    pub feedback: String,

    pub mood: String,

    /// Score of the report the card was generated from
    pub health_score: Option<u8>,

    pub created_at: String,
}
