//! Health report analysis: file checks, the extraction prompt, and scoring of
//! whatever the model pulls out of the report.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use serde_json::Map;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::entities::{FileType, Gender, ReportAnalysis};
use crate::services::gemini::{GeminiClient, GeminiError};
use crate::services::health_score::calculate_health_score;
use crate::services::health_standards::HealthStandards;

/// Canonical vital stat keys requested from the model, in prompt order
pub const VITAL_STAT_KEYS: [&str; 22] = [
    "glucose",
    "hemoglobin_a1c",
    "total_cholesterol",
    "triglycerides",
    "ldl_cholesterol",
    "hdl_cholesterol",
    "bmi",
    "alt",
    "ast",
    "creatinine",
    "egfr",
    "uric_acid",
    "wbc",
    "rbc",
    "hemoglobin",
    "platelet",
    "urine_glucose",
    "urine_protein",
    "blood_pressure_systolic",
    "blood_pressure_diastolic",
    "HBsAg",
    "urine_ob",
];

/// Smallest accepted image side in pixels
pub const MIN_IMAGE_DIMENSION: usize = 100;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Unsupported image format, only JPEG and PNG are accepted")]
    UnsupportedImageFormat,

    #[error("Image resolution too low ({width}x{height})")]
    ResolutionTooLow { width: usize, height: usize },

    #[error("Document is empty")]
    EmptyDocument,

    #[error(transparent)]
    Gemini(#[from] GeminiError),
}

/// Turns an uploaded report file into scored vital stats
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        bytes: &[u8],
        user_id: &str,
        file_type: FileType,
        gender: Option<Gender>,
    ) -> Result<ReportAnalysis, AnalysisError>;
}

/// Required answer language of every extraction
pub const ANSWER_LANGUAGE_INSTRUCTION: &str = "請你務必使用繁體中文";

/// Extraction prompt for a report uploaded by `user_id` on `report_date`
pub fn build_prompt(user_id: &str, report_date: &str) -> String {
    let fields = VITAL_STAT_KEYS
        .iter()
        .map(|key| format!("    \"{}\": null", key))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        r#"You are a professional medical data analyst. Extract the important health data from this health examination report precisely and return it as JSON.
{ANSWER_LANGUAGE_INSTRUCTION} (always answer in Traditional Chinese), and return the result in JSON format.

Try to find every field listed below. If the report does not contain a value, set it to null.
Use today's date as the report date (format: YYYY/MM/DD).

Pay close attention to the aliases of each field and put each value under the correct standard field name.
For example, if the report shows "SGPT", put the value in "alt". If it shows "TG", put the value in "triglycerides".

{{
  "user_uid": "{user_id}",
  "report_date": "{report_date}",
  "vital_stats": {{
{fields}
  }}
}}

Return only the JSON content, without any extra text or explanation."#
    )
}

/// Check an image before it is sent anywhere. Returns its MIME type.
pub fn validate_image(bytes: &[u8]) -> Result<&'static str, AnalysisError> {
    let mime_type = match imagesize::image_type(bytes) {
        Ok(imagesize::ImageType::Jpeg) => "image/jpeg",
        Ok(imagesize::ImageType::Png) => "image/png",
        Ok(other) => {
            error!("Unsupported image format: {:?}", other);
            return Err(AnalysisError::UnsupportedImageFormat);
        },
        Err(e) => {
            error!("Could not identify image: {:?}", e);
            return Err(AnalysisError::UnsupportedImageFormat);
        }
    };

    let size = imagesize::blob_size(bytes).map_err(|e| {
        error!("Could not read image size: {:?}", e);
        AnalysisError::UnsupportedImageFormat
    })?;

    if size.width < MIN_IMAGE_DIMENSION || size.height < MIN_IMAGE_DIMENSION {
        error!("Image resolution too low: {}x{}", size.width, size.height);
        return Err(AnalysisError::ResolutionTooLow { width: size.width, height: size.height });
    }

    Ok(mime_type)
}

/// Analyzer backed by Gemini and a standards table
pub struct GeminiReportAnalyzer {
    client: GeminiClient,
    standards: Arc<HealthStandards>,
}

impl GeminiReportAnalyzer {
    pub fn new(client: GeminiClient, standards: Arc<HealthStandards>) -> Self {
        Self { client, standards }
    }
}

#[async_trait]
impl ReportAnalyzer for GeminiReportAnalyzer {
    async fn analyze(
        &self,
        bytes: &[u8],
        user_id: &str,
        file_type: FileType,
        gender: Option<Gender>,
    ) -> Result<ReportAnalysis, AnalysisError> {
        let mime_type = match file_type {
            FileType::Image => validate_image(bytes)?,
            FileType::Pdf if bytes.is_empty() => return Err(AnalysisError::EmptyDocument),
            FileType::Pdf => "application/pdf",
        };

        let today = Local::now().format("%Y/%m/%d").to_string();
        let prompt = build_prompt(user_id, &today);
        let extracted = self.client.analyze_document(&prompt, mime_type, bytes).await?;

        let raw_stats = extracted
            .get("vital_stats")
            .and_then(|stats| stats.as_object())
            .cloned()
            .unwrap_or_else(|| {
                warn!("vital_stats is not an object, scoring an empty report");
                Map::new()
            });
        let vital_stats = self.standards.normalize(&raw_stats);

        let (health_score, warnings) = calculate_health_score(&vital_stats, gender, &self.standards);
        info!("Report for user {} scored {} with {} warnings", user_id, health_score, warnings.len());
        debug!("Health warnings: {:?}", warnings);

        Ok(ReportAnalysis { extracted, vital_stats, health_score, warnings })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// PNG signature and IHDR chunk for an image of the given size
    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(&13u32.to_be_bytes());
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        bytes
    }

    #[test]
    fn test_prompt_lists_every_field() {
        let prompt = build_prompt("user-42", "2026/10/15");
        assert!(prompt.contains("\"user_uid\": \"user-42\""));
        assert!(prompt.contains("\"report_date\": \"2026/10/15\""));
        assert!(prompt.contains("\"SGPT\""));
        assert!(prompt.contains("請你務必使用繁體中文"));
        for key in VITAL_STAT_KEYS {
            assert!(prompt.contains(&format!("\"{}\": null", key)), "missing {}", key);
        }
    }

    #[test]
    fn test_validate_image() {
        assert_eq!(validate_image(&png_bytes(800, 600)).unwrap(), "image/png");

        assert!(matches!(
            validate_image(&png_bytes(99, 600)),
            Err(AnalysisError::ResolutionTooLow { width: 99, height: 600 })
        ));

        let gif = b"GIF89a\x40\x01\xf0\x00\x00\x00\x00";
        assert!(matches!(validate_image(gif), Err(AnalysisError::UnsupportedImageFormat)));
        assert!(matches!(validate_image(b"plain text"), Err(AnalysisError::UnsupportedImageFormat)));
    }

    #[tokio::test]
    async fn test_rejected_files_never_reach_the_model() {
        // Unroutable base: any request would fail with a request error
        let client = GeminiClient::new("key", "model", "http://127.0.0.1:9");
        let analyzer = GeminiReportAnalyzer::new(client, crate::services::health_standards::default_standards());

        let tiny = analyzer.analyze(&png_bytes(50, 50), "u1", FileType::Image, None).await;
        assert!(matches!(tiny, Err(AnalysisError::ResolutionTooLow { .. })));

        let empty_pdf = analyzer.analyze(&[], "u1", FileType::Pdf, None).await;
        assert!(matches!(empty_pdf, Err(AnalysisError::EmptyDocument)));
    }
}
