use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Kind of uploaded report file
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Image,
    Pdf,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Image => "image",
            FileType::Pdf => "pdf",
        }
    }

    /// Classify an upload by its (case-insensitive) extension.
    /// Returns `None` for anything but `.pdf`, `.jpg`, `.jpeg` and `.png`.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let lower = filename.to_lowercase();
        if [".jpg", ".jpeg", ".png"].iter().any(|ext| lower.ends_with(ext)) {
            Some(FileType::Image)
        } else if lower.ends_with(".pdf") {
            Some(FileType::Pdf)
        } else {
            None
        }
    }

    /// Content type used when serving the stored file back
    pub fn content_type(filename: &str) -> &'static str {
        let lower = filename.to_lowercase();
        if lower.ends_with(".png") {
            "image/png"
        } else if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
            "image/jpeg"
        } else if lower.ends_with(".pdf") {
            "application/pdf"
        } else {
            "application/octet-stream"
        }
    }
}

/// Outcome of the AI analysis step of an upload
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Pending,
    Completed,
    Failed,
    /// No analyzer configured
    Skipped,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::Failed => "failed",
            AnalysisStatus::Skipped => "skipped",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(AnalysisStatus::Pending),
            "completed" => Some(AnalysisStatus::Completed),
            "failed" => Some(AnalysisStatus::Failed),
            "skipped" => Some(AnalysisStatus::Skipped),
            _ => None,
        }
    }
}

/// Uploaded health examination report with its analysis results
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthReport {
    /// Unique identifier for the report
    pub id: String,

    /// Owner of the report
    pub user_id: String,

    /// File name as uploaded
    pub filename: String,

    /// Location inside the file store
    pub storage_path: String,

    pub file_type: FileType,

    pub upload_time: String,

    pub analysis_status: AnalysisStatus,

    /// Report date from the analysis (YYYY/MM/DD)
    pub report_date: Option<String>,

    /// Vital stats keyed by canonical metric name
    #[schema(value_type = Option<Object>)]
    pub vital_stats: Option<Value>,

    /// Health score between 1 and 100
    pub health_score: Option<u8>,

    /// Scoring warnings
    pub warnings: Vec<String>,
}

/// Result of analyzing one report file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportAnalysis {
    /// Raw object returned by the model
    pub extracted: Value,

    /// Vital stats re-keyed onto canonical metric names
    pub vital_stats: Map<String, Value>,

    pub health_score: u8,

    pub warnings: Vec<String>,
}

/// Stored report file ready to be served
#[derive(Debug, Clone)]
pub struct ReportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}
