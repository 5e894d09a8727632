use serde::{Deserialize, Serialize};

/// Storage model for an uploaded health examination report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReportRecord {
    /// Unique identifier for the report
    pub id: String,

    /// Owner of the report
    pub user_id: String,

    /// File name as uploaded
    pub filename: String,

    /// Location of the file inside the file store
    pub storage_path: String,

    /// "image" or "pdf"
    pub file_type: String,

    /// RFC 3339 upload timestamp
    pub upload_time: String,

    /// "completed", "failed" or "skipped"
    pub analysis_status: String,

    /// Report date reported by the analyzer (YYYY/MM/DD)
    pub report_date: Option<String>,

    /// Extracted vital stats keyed by canonical metric name
    pub vital_stats: Option<serde_json::Value>,

    /// Health score between 1 and 100
    pub health_score: Option<u8>,

    /// Human-readable scoring warnings
    pub warnings: Vec<String>,
}

/// Input data for recording a new health report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHealthReport {
    pub user_id: String,
    pub filename: String,
    pub storage_path: String,
    pub file_type: String,
    pub analysis_status: String,
    pub report_date: Option<String>,
    pub vital_stats: Option<serde_json::Value>,
    pub health_score: Option<u8>,
    pub warnings: Vec<String>,
}
