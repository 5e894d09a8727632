use chrono::{SecondsFormat, Utc};
use tracing::{debug, error};
use uuid::Uuid;
use async_trait::async_trait;

use crate::models::health_report::{HealthReportRecord, NewHealthReport};
use crate::database::get_db_pool;
use super::errors::RepositoryError;
use super::in_memory::InMemoryStorage;
use super::storage::DatabaseStorage;

/// Repository trait for uploaded health reports
#[async_trait]
pub trait HealthReportRepositoryTrait {
    /// Record a new report together with its analysis outcome.
    /// Fails with `Conflict` when the user already has a report.
    async fn create(&self, report: NewHealthReport) -> Result<HealthReportRecord, RepositoryError>;

    /// All reports of a user, newest first
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<HealthReportRecord>, RepositoryError>;

    /// Get a report by ID
    async fn get_by_id(&self, id: &str) -> Result<Option<HealthReportRecord>, RepositoryError>;
}

/// Repository for health reports, SQLite first with an in-memory fallback
#[derive(Debug, Clone, Default)]
pub struct HealthReportRepository {
    storage: InMemoryStorage,
}

impl HealthReportRepository {
    /// Create a new repository
    pub fn new() -> Self {
        Self {
            storage: InMemoryStorage::new(),
        }
    }
}

#[async_trait]
impl HealthReportRepositoryTrait for HealthReportRepository {
    async fn create(&self, report: NewHealthReport) -> Result<HealthReportRecord, RepositoryError> {
        let record = HealthReportRecord {
            id: Uuid::new_v4().to_string(),
            user_id: report.user_id,
            filename: report.filename,
            storage_path: report.storage_path,
            file_type: report.file_type,
            upload_time: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            analysis_status: report.analysis_status,
            report_date: report.report_date,
            vital_stats: report.vital_stats,
            health_score: report.health_score,
            warnings: report.warnings,
        };

        match get_db_pool() {
            Ok(pool) => {
                debug!("Storing health report in database: {}", record.id);
                match DatabaseStorage::store_health_report(&pool, &record).await {
                    Ok(_) => Ok(record),
                    Err(e @ RepositoryError::Conflict(_)) => Err(e),
                    Err(e) => {
                        error!("Failed to store health report in database: {}", e);
                        self.storage.store_health_report(&record).await
                    }
                }
            },
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage", e);
                self.storage.store_health_report(&record).await
            }
        }
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<HealthReportRecord>, RepositoryError> {
        match get_db_pool() {
            Ok(pool) => {
                debug!("Listing health reports from database for user {}", user_id);
                match DatabaseStorage::list_health_reports(&pool, user_id).await {
                    Ok(reports) => Ok(reports),
                    Err(e) => {
                        error!("Failed to list health reports from database: {}", e);
                        self.storage.list_health_reports(user_id).await
                    }
                }
            },
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage for list_by_user", e);
                self.storage.list_health_reports(user_id).await
            }
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<HealthReportRecord>, RepositoryError> {
        match get_db_pool() {
            Ok(pool) => {
                debug!("Getting health report by ID from database: {}", id);
                match DatabaseStorage::get_health_report(&pool, id).await {
                    Ok(report) => Ok(report),
                    Err(e) => {
                        error!("Failed to get health report from database: {}", e);
                        self.storage.get_health_report(id).await
                    }
                }
            },
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage for get_by_id", e);
                self.storage.get_health_report(id).await
            }
        }
    }
}
