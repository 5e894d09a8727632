use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Gender used to pick gendered reference values
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    /// Parse a stored or submitted gender. Anything other than male or female is unset.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            _ => None,
        }
    }
}

/// Registered user account, without credentials
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Unique identifier for the user
    pub id: String,

    /// Lower-cased email address
    pub email: String,

    /// Optional gender
    pub gender: Option<Gender>,

    /// When the account was created
    pub created_at: String,

    /// Latest successful login, unset until the first login
    pub last_login: Option<String>,
}
