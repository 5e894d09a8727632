use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use emo_cat_guide_data::files::{report_storage_path, FileStoreTrait};
use emo_cat_guide_data::models::health_report::NewHealthReport;
use emo_cat_guide_data::repository::{HealthReportRepositoryTrait, RepositoryError, UserRepositoryTrait};

use crate::entities::conversions::convert_to_domain_health_report;
use crate::entities::{AnalysisStatus, FileType, Gender, HealthReport, ReportFile};
use crate::services::errors::ServiceError;
use crate::services::report_analysis::ReportAnalyzer;

/// Returned when a user uploads a second report
pub const ALREADY_UPLOADED: &str = "Health report already uploaded, continue with the psychology test";

pub type FileStore = Arc<dyn FileStoreTrait + Send + Sync>;
pub type Analyzer = Arc<dyn ReportAnalyzer>;

/// Health report operations
#[async_trait]
pub trait HealthReportServiceTrait {
    /// Validate, store and analyze a report upload.
    /// An empty filename means no file was sent.
    async fn upload(&self, user_id: &str, filename: &str, bytes: Vec<u8>) -> Result<HealthReport, ServiceError>;

    /// Reports of a user, newest first
    async fn list(&self, user_id: &str) -> Result<Vec<HealthReport>, ServiceError>;

    /// One report of a user. Reports of other users are not found.
    async fn get(&self, user_id: &str, report_id: &str) -> Result<HealthReport, ServiceError>;

    /// The stored file of a report
    async fn file(&self, user_id: &str, report_id: &str) -> Result<ReportFile, ServiceError>;
}

pub struct HealthReportService<R, U>
where
    R: HealthReportRepositoryTrait,
    U: UserRepositoryTrait,
{
    reports: R,
    users: U,
    files: FileStore,
    analyzer: Option<Analyzer>,
    max_upload_bytes: usize,
}

impl<R, U> HealthReportService<R, U>
where
    R: HealthReportRepositoryTrait,
    U: UserRepositoryTrait,
{
    pub fn new(reports: R, users: U, files: FileStore, analyzer: Option<Analyzer>, max_upload_bytes: usize) -> Self {
        if analyzer.is_none() {
            info!("No report analyzer configured, uploads will not be analyzed");
        }
        Self { reports, users, files, analyzer, max_upload_bytes }
    }
}

impl<R, U> HealthReportService<R, U>
where
    R: HealthReportRepositoryTrait + Send + Sync,
    U: UserRepositoryTrait + Send + Sync,
{
    async fn user_gender(&self, user_id: &str) -> Option<Gender> {
        match self.users.get_by_id(user_id).await {
            Ok(user) => user.and_then(|u| u.gender).and_then(|g| Gender::parse(&g)),
            Err(e) => {
                warn!("Could not load gender for user {}: {}", user_id, e);
                None
            }
        }
    }

    fn validate_upload(&self, filename: &str, size: usize) -> Result<FileType, ServiceError> {
        if filename.trim().is_empty() {
            return Err(ServiceError::Validation("No file selected".to_string()));
        }

        let file_type = FileType::from_filename(filename).ok_or_else(|| {
            ServiceError::Validation("Unsupported file type, allowed types are pdf, jpg, jpeg and png".to_string())
        })?;

        if size > self.max_upload_bytes {
            return Err(ServiceError::PayloadTooLarge(format!(
                "File is larger than {} MB",
                self.max_upload_bytes / (1024 * 1024)
            )));
        }

        Ok(file_type)
    }

    /// Drop the file of an upload that lost the race for the user's only report slot
    async fn discard_losing_upload(&self, user_id: &str, storage_path: &str) {
        // Same-second uploads of the same filename share a path with the winner
        let kept = match self.reports.list_by_user(user_id).await {
            Ok(reports) => reports.iter().any(|r| r.storage_path == storage_path),
            Err(e) => {
                warn!("Could not list reports of user {}: {}", user_id, e);
                true
            }
        };
        if kept {
            return;
        }
        if let Err(e) = self.files.delete(storage_path).await {
            error!("Failed to remove orphaned upload {}: {}", storage_path, e);
        }
    }
}

#[async_trait]
impl<R, U> HealthReportServiceTrait for HealthReportService<R, U>
where
    R: HealthReportRepositoryTrait + Send + Sync,
    U: UserRepositoryTrait + Send + Sync,
{
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(&self, user_id: &str, filename: &str, bytes: Vec<u8>) -> Result<HealthReport, ServiceError> {
        if !self.reports.list_by_user(user_id).await?.is_empty() {
            debug!("User {} already has a report", user_id);
            return Err(ServiceError::Conflict(ALREADY_UPLOADED.to_string()));
        }

        let file_type = self.validate_upload(filename, bytes.len())?;

        let storage_path = report_storage_path(user_id, filename, Utc::now());
        self.files.put(&storage_path, &bytes).await?;
        info!("Stored {} report for user {} at {}", file_type.as_str(), user_id, storage_path);

        let mut report = NewHealthReport {
            user_id: user_id.to_string(),
            filename: filename.to_string(),
            storage_path,
            file_type: file_type.as_str().to_string(),
            analysis_status: AnalysisStatus::Skipped.as_str().to_string(),
            report_date: None,
            vital_stats: None,
            health_score: None,
            warnings: Vec::new(),
        };

        if let Some(analyzer) = &self.analyzer {
            let gender = self.user_gender(user_id).await;
            match analyzer.analyze(&bytes, user_id, file_type, gender).await {
                Ok(analysis) => {
                    report.analysis_status = AnalysisStatus::Completed.as_str().to_string();
                    report.report_date = analysis
                        .extracted
                        .get("report_date")
                        .and_then(Value::as_str)
                        .map(str::to_string);
                    report.vital_stats = Some(Value::Object(analysis.vital_stats));
                    report.health_score = Some(analysis.health_score);
                    report.warnings = analysis.warnings;
                },
                Err(e) => {
                    warn!("Analysis failed for user {}: {}", user_id, e);
                    report.analysis_status = AnalysisStatus::Failed.as_str().to_string();
                }
            }
        }

        let storage_path = report.storage_path.clone();
        match self.reports.create(report).await {
            Ok(record) => Ok(convert_to_domain_health_report(record)),
            Err(RepositoryError::Conflict(msg)) => {
                debug!("Concurrent upload for user {} lost: {}", user_id, msg);
                self.discard_losing_upload(user_id, &storage_path).await;
                Err(ServiceError::Conflict(ALREADY_UPLOADED.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, user_id: &str) -> Result<Vec<HealthReport>, ServiceError> {
        let records = self.reports.list_by_user(user_id).await?;
        Ok(records.into_iter().map(convert_to_domain_health_report).collect())
    }

    async fn get(&self, user_id: &str, report_id: &str) -> Result<HealthReport, ServiceError> {
        match self.reports.get_by_id(report_id).await? {
            Some(record) if record.user_id == user_id => Ok(convert_to_domain_health_report(record)),
            _ => Err(ServiceError::NotFound(format!("health report {}", report_id))),
        }
    }

    async fn file(&self, user_id: &str, report_id: &str) -> Result<ReportFile, ServiceError> {
        let report = self.get(user_id, report_id).await?;
        let bytes = self.files.get(&report.storage_path).await?;

        Ok(ReportFile {
            content_type: FileType::content_type(&report.filename),
            filename: report.filename,
            bytes,
        })
    }
}
