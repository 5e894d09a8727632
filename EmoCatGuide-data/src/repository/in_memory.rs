use std::sync::{Arc, Mutex};
use std::collections::HashMap;

use crate::models::cat_card::CatCardRecord;
use crate::models::health_report::HealthReportRecord;
use crate::models::psychology_test::PsychologyTestRecord;
use crate::models::user::UserRecord;
use super::errors::RepositoryError;

/// In-memory tables used when the database is not available
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    users: Arc<Mutex<HashMap<String, UserRecord>>>,
    health_reports: Arc<Mutex<HashMap<String, HealthReportRecord>>>,
    psychology_tests: Arc<Mutex<HashMap<String, PsychologyTestRecord>>>,
    cat_cards: Arc<Mutex<HashMap<String, CatCardRecord>>>,
}

impl InMemoryStorage {
    /// Create a new in-memory storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a user, rejecting a second account for the same email
    pub async fn store_user(&self, user: &UserRecord) -> Result<UserRecord, RepositoryError> {
        let mut store = self.users.lock()?;
        if store.values().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(RepositoryError::Conflict(format!("email already registered: {}", user.email)));
        }
        store.insert(user.id.clone(), user.clone());
        Ok(user.clone())
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepositoryError> {
        let store = self.users.lock()?;
        Ok(store.values().find(|u| u.email.eq_ignore_ascii_case(email)).cloned())
    }

    pub async fn get_user_by_id(&self, id: &str) -> Result<Option<UserRecord>, RepositoryError> {
        let store = self.users.lock()?;
        Ok(store.get(id).cloned())
    }

    /// Set the last login timestamp of a user
    pub async fn update_last_login(&self, id: &str, timestamp: &str) -> Result<(), RepositoryError> {
        let mut store = self.users.lock()?;
        match store.get_mut(id) {
            Some(user) => {
                user.last_login = Some(timestamp.to_string());
                Ok(())
            }
            None => Err(RepositoryError::NotFound(format!("user {}", id))),
        }
    }

    /// Store a health report in memory
    pub async fn store_health_report(&self, report: &HealthReportRecord) -> Result<HealthReportRecord, RepositoryError> {
        let mut store = self.health_reports.lock()?;
        if store.values().any(|r| r.user_id == report.user_id) {
            return Err(RepositoryError::Conflict(format!("user {} already has a health report", report.user_id)));
        }
        store.insert(report.id.clone(), report.clone());
        Ok(report.clone())
    }

    /// Reports of one user, newest first
    pub async fn list_health_reports(&self, user_id: &str) -> Result<Vec<HealthReportRecord>, RepositoryError> {
        let store = self.health_reports.lock()?;
        let mut reports: Vec<HealthReportRecord> = store
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        reports.sort_by(|a, b| b.upload_time.cmp(&a.upload_time));
        Ok(reports)
    }

    pub async fn get_health_report(&self, id: &str) -> Result<Option<HealthReportRecord>, RepositoryError> {
        let store = self.health_reports.lock()?;
        Ok(store.get(id).cloned())
    }

    /// Store a questionnaire submission in memory
    pub async fn store_psychology_test(&self, test: &PsychologyTestRecord) -> Result<PsychologyTestRecord, RepositoryError> {
        let mut store = self.psychology_tests.lock()?;
        store.insert(test.id.clone(), test.clone());
        Ok(test.clone())
    }

    /// Submissions of one user, newest first
    pub async fn list_psychology_tests(&self, user_id: &str) -> Result<Vec<PsychologyTestRecord>, RepositoryError> {
        let store = self.psychology_tests.lock()?;
        let mut tests: Vec<PsychologyTestRecord> = store
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        tests.sort_by(|a, b| b.submit_time.cmp(&a.submit_time));
        Ok(tests)
    }

    /// Store a cat card in memory
    pub async fn store_cat_card(&self, card: &CatCardRecord) -> Result<CatCardRecord, RepositoryError> {
        let mut store = self.cat_cards.lock()?;
        store.insert(card.id.clone(), card.clone());
        Ok(card.clone())
    }

    /// Cards of one user, newest first
    pub async fn list_cat_cards(&self, user_id: &str) -> Result<Vec<CatCardRecord>, RepositoryError> {
        let store = self.cat_cards.lock()?;
        let mut cards: Vec<CatCardRecord> = store
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        cards.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(cards)
    }
}
