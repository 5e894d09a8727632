use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use validator::Validate;

use emo_cat_guide_data::models::user::NewUser;
use emo_cat_guide_data::repository::{UserRepository, UserRepositoryTrait};

use crate::auth::logging::mask_secret;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::{LoginRequest, RegisterRequest};
use crate::entities::conversions::convert_to_domain_user;
use crate::entities::User;
use crate::services::errors::{validation_message, ServiceError};

/// Message returned for both unknown emails and wrong passwords
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Account operations
#[async_trait]
pub trait UserServiceTrait {
    /// Create an account. Fails with `Conflict` when the email is taken.
    async fn register(&self, request: RegisterRequest) -> Result<User, ServiceError>;

    /// Check credentials and record the login
    async fn login(&self, request: LoginRequest) -> Result<User, ServiceError>;

    /// Look up a user by ID
    async fn get_user(&self, user_id: &str) -> Result<User, ServiceError>;
}

/// Account service backed by a user repository
pub struct UserService<R: UserRepositoryTrait> {
    repository: R,
}

impl<R: UserRepositoryTrait> UserService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<R: UserRepositoryTrait + Send + Sync> UserServiceTrait for UserService<R> {
    async fn register(&self, request: RegisterRequest) -> Result<User, ServiceError> {
        debug!("Registering {} with password {}", request.email, mask_secret(&request.password));

        if let Err(errors) = request.validate() {
            return Err(ServiceError::Validation(validation_message(&errors)));
        }

        let password_hash = hash_password(&request.password)?;
        let record = self.repository.create(NewUser {
            email: request.email.trim().to_lowercase(),
            password_hash,
            gender: request.gender.map(|g| g.as_str().to_string()),
        }).await?;

        info!("Registered user {}", record.id);
        Ok(convert_to_domain_user(record))
    }

    async fn login(&self, request: LoginRequest) -> Result<User, ServiceError> {
        debug!("Login attempt for {} with password {}", request.email, mask_secret(&request.password));

        let record = match self.repository.get_by_email(&request.email.trim().to_lowercase()).await? {
            Some(record) => record,
            None => {
                warn!("Login for unknown email");
                return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
            }
        };

        if !verify_password(&request.password, &record.password_hash) {
            warn!("Wrong password for user {}", record.id);
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        self.repository.update_last_login(&record.id).await?;
        let updated = self.repository.get_by_id(&record.id).await?.unwrap_or(record);

        Ok(convert_to_domain_user(updated))
    }

    async fn get_user(&self, user_id: &str) -> Result<User, ServiceError> {
        self.repository
            .get_by_id(user_id)
            .await?
            .map(convert_to_domain_user)
            .ok_or_else(|| ServiceError::NotFound(format!("user {}", user_id)))
    }
}

/// Create the user service with the default repository
pub fn create_default_user_service() -> Arc<dyn UserServiceTrait + Send + Sync> {
    Arc::new(UserService::new(UserRepository::new()))
}
