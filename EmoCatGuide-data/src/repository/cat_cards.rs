use chrono::{SecondsFormat, Utc};
use tracing::{debug, error};
use uuid::Uuid;
use async_trait::async_trait;

use crate::models::cat_card::{CatCardRecord, NewCatCard};
use crate::database::get_db_pool;
use super::errors::RepositoryError;
use super::in_memory::InMemoryStorage;
use super::storage::DatabaseStorage;

/// Repository trait for generated cat cards
#[async_trait]
pub trait CatCardRepositoryTrait {
    /// Persist a generated card
    async fn create(&self, card: NewCatCard) -> Result<CatCardRecord, RepositoryError>;

    /// All cards of a user, newest first
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<CatCardRecord>, RepositoryError>;
}

/// Repository for cat cards
#[derive(Debug, Clone, Default)]
pub struct CatCardRepository {
    storage: InMemoryStorage,
}

impl CatCardRepository {
    /// Create a new repository
    pub fn new() -> Self {
        Self {
            storage: InMemoryStorage::new(),
        }
    }
}

#[async_trait]
impl CatCardRepositoryTrait for CatCardRepository {
    async fn create(&self, card: NewCatCard) -> Result<CatCardRecord, RepositoryError> {
        let record = CatCardRecord {
            id: Uuid::new_v4().to_string(),
            user_id: card.user_id,
            cat: card.cat,
            title: card.title,
            image_url: card.image_url,
            feedback: card.feedback,
            mood: card.mood,
            health_score: card.health_score,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        };

        match get_db_pool() {
            Ok(pool) => {
                debug!("Storing cat card in database: {}", record.id);
                match DatabaseStorage::store_cat_card(&pool, &record).await {
                    Ok(_) => Ok(record),
                    Err(e) => {
                        error!("Failed to store cat card in database: {}", e);
                        self.storage.store_cat_card(&record).await
                    }
                }
            },
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage", e);
                self.storage.store_cat_card(&record).await
            }
        }
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<CatCardRecord>, RepositoryError> {
        match get_db_pool() {
            Ok(pool) => {
                match DatabaseStorage::list_cat_cards(&pool, user_id).await {
                    Ok(cards) => Ok(cards),
                    Err(e) => {
                        error!("Failed to list cat cards from database: {}", e);
                        self.storage.list_cat_cards(user_id).await
                    }
                }
            },
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage for list_by_user", e);
                self.storage.list_cat_cards(user_id).await
            }
        }
    }
}
