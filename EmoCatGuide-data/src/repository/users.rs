use chrono::{SecondsFormat, Utc};
use tracing::{debug, error};
use uuid::Uuid;
use async_trait::async_trait;

use crate::models::user::{NewUser, UserRecord};
use crate::database::get_db_pool;
use super::errors::RepositoryError;
use super::in_memory::InMemoryStorage;
use super::storage::DatabaseStorage;

/// Repository trait for user accounts
#[async_trait]
pub trait UserRepositoryTrait {
    /// Create a new user. Fails with `Conflict` when the email is taken.
    async fn create(&self, new_user: NewUser) -> Result<UserRecord, RepositoryError>;

    /// Find a user by email (case-insensitive)
    async fn get_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepositoryError>;

    /// Find a user by ID
    async fn get_by_id(&self, id: &str) -> Result<Option<UserRecord>, RepositoryError>;

    /// Record a successful login
    async fn update_last_login(&self, id: &str) -> Result<(), RepositoryError>;
}

/// Repository for user accounts, SQLite first with an in-memory fallback
#[derive(Debug, Clone, Default)]
pub struct UserRepository {
    storage: InMemoryStorage,
}

impl UserRepository {
    /// Create a new repository
    pub fn new() -> Self {
        Self {
            storage: InMemoryStorage::new(),
        }
    }
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn create(&self, new_user: NewUser) -> Result<UserRecord, RepositoryError> {
        let user = UserRecord {
            id: Uuid::new_v4().to_string(),
            email: new_user.email.trim().to_lowercase(),
            password_hash: new_user.password_hash,
            gender: new_user.gender,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            last_login: None,
        };

        match get_db_pool() {
            Ok(pool) => {
                debug!("Storing user in database: {}", user.id);
                match DatabaseStorage::store_user(&pool, &user).await {
                    Ok(_) => Ok(user),
                    Err(e) if !e.is_backend_failure() => Err(e),
                    Err(e) => {
                        error!("Failed to store user in database: {}", e);
                        self.storage.store_user(&user).await
                    }
                }
            },
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage", e);
                self.storage.store_user(&user).await
            }
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepositoryError> {
        let email = email.trim();
        match get_db_pool() {
            Ok(pool) => {
                match DatabaseStorage::get_user_by_email(&pool, email).await {
                    Ok(user) => Ok(user),
                    Err(e) => {
                        error!("Failed to get user by email from database: {}", e);
                        self.storage.get_user_by_email(email).await
                    }
                }
            },
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage for get_by_email", e);
                self.storage.get_user_by_email(email).await
            }
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<UserRecord>, RepositoryError> {
        match get_db_pool() {
            Ok(pool) => {
                match DatabaseStorage::get_user_by_id(&pool, id).await {
                    Ok(user) => Ok(user),
                    Err(e) => {
                        error!("Failed to get user by ID from database: {}", e);
                        self.storage.get_user_by_id(id).await
                    }
                }
            },
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage for get_by_id", e);
                self.storage.get_user_by_id(id).await
            }
        }
    }

    async fn update_last_login(&self, id: &str) -> Result<(), RepositoryError> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        match get_db_pool() {
            Ok(pool) => {
                match DatabaseStorage::update_last_login(&pool, id, &now).await {
                    Ok(()) => Ok(()),
                    Err(e) if !e.is_backend_failure() => Err(e),
                    Err(e) => {
                        error!("Failed to update last login in database: {}", e);
                        self.storage.update_last_login(id, &now).await
                    }
                }
            },
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage for update_last_login", e);
                self.storage.update_last_login(id, &now).await
            }
        }
    }
}
