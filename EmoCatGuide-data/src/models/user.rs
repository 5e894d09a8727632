use serde::{Deserialize, Serialize};

/// Storage model for a registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// Unique identifier for the user
    pub id: String,

    /// Lower-cased email address, unique across users
    pub email: String,

    /// Argon2 PHC string
    pub password_hash: String,

    /// Optional gender used to pick gendered reference values
    pub gender: Option<String>,

    /// RFC 3339 creation timestamp
    pub created_at: String,

    /// RFC 3339 timestamp of the latest successful login
    pub last_login: Option<String>,
}

/// Input data for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    /// Lower-cased email address
    pub email: String,

    /// Argon2 PHC string
    pub password_hash: String,

    /// Optional gender
    pub gender: Option<String>,
}
