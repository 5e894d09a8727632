// Test doubles for the domain layer
// Only available when the "mock" feature is enabled

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

pub use emo_cat_guide_data::files::InMemoryFileStore;

use crate::config::AppConfig;
use crate::entities::{FileType, Gender, ReportAnalysis};
use crate::health::{ComponentStatus, HealthComponent, HealthServiceTrait, SystemHealth, SystemStatus};
use crate::services::cat_cards::TextGenerator;
use crate::services::gemini::GeminiError;
use crate::services::health_score::calculate_health_score;
use crate::services::health_standards::default_standards;
use crate::services::report_analysis::{AnalysisError, ReportAnalyzer};
use crate::services::{create_services, AppServices};

/// Analyzer that returns canned vital stats without calling any model
#[derive(Debug, Clone)]
pub struct StubReportAnalyzer {
    vital_stats: Option<Map<String, Value>>,
}

impl Default for StubReportAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl StubReportAnalyzer {
    /// Analyzer reporting a healthy set of results
    pub fn new() -> Self {
        let stats = json!({
            "glucose": 92,
            "ldl_cholesterol": 110,
            "hdl_cholesterol": 55,
            "blood_pressure_systolic": 118,
            "blood_pressure_diastolic": 76,
            "HBsAg": "(-)"
        });
        Self { vital_stats: stats.as_object().cloned() }
    }

    /// Analyzer reporting the given stats
    pub fn with_vital_stats(stats: Value) -> Self {
        Self { vital_stats: stats.as_object().cloned() }
    }

    /// Analyzer whose every analysis fails
    pub fn failing() -> Self {
        Self { vital_stats: None }
    }
}

#[async_trait]
impl ReportAnalyzer for StubReportAnalyzer {
    async fn analyze(
        &self,
        _bytes: &[u8],
        user_id: &str,
        _file_type: FileType,
        gender: Option<Gender>,
    ) -> Result<ReportAnalysis, AnalysisError> {
        let vital_stats = self
            .vital_stats
            .clone()
            .ok_or_else(|| AnalysisError::Gemini(GeminiError::EmptyResponse))?;

        let standards = default_standards();
        let vital_stats = standards.normalize(&vital_stats);
        let (health_score, warnings) = calculate_health_score(&vital_stats, gender, &standards);

        Ok(ReportAnalysis {
            extracted: json!({
                "user_uid": user_id,
                "report_date": "2026/01/01",
                "vital_stats": vital_stats.clone(),
            }),
            vital_stats,
            health_score,
            warnings,
        })
    }
}

/// Text generator that always answers with the same text
#[derive(Debug, Clone)]
pub struct StubTextGenerator {
    pub reply: String,
}

#[async_trait]
impl TextGenerator for StubTextGenerator {
    async fn generate_text(&self, _prompt: &str) -> Result<String, GeminiError> {
        Ok(self.reply.clone())
    }
}

/// Services over in-memory repositories and file storage
pub fn create_test_services(analyzer: Option<StubReportAnalyzer>) -> AppServices {
    let analyzer = analyzer.map(|a| Arc::new(a) as Arc<dyn ReportAnalyzer>);
    create_services(&AppConfig::default(), Arc::new(InMemoryFileStore::new()), analyzer, None)
}

/// Mock implementation of health services for testing system health
#[derive(Debug)]
pub struct MockHealthService {
    database_status: ComponentStatus,
    /// Overrides the status derived from the components
    system_status: Option<SystemStatus>,
    components: HashMap<String, HealthComponent>,
}

impl Default for MockHealthService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHealthService {
    /// Create a new mock health service with all components healthy
    pub fn new() -> Self {
        Self {
            database_status: ComponentStatus::Healthy,
            system_status: None,
            components: HashMap::new(),
        }
    }

    pub fn with_degraded_database(mut self) -> Self {
        self.database_status = ComponentStatus::Degraded;
        self
    }

    pub fn with_unhealthy_database(mut self) -> Self {
        self.database_status = ComponentStatus::Unhealthy;
        self
    }

    pub fn with_system_status(mut self, status: SystemStatus) -> Self {
        self.system_status = Some(status);
        self
    }

    /// Add a custom component with a specific status
    pub fn with_component(mut self, name: &str, status: ComponentStatus, details: Option<String>) -> Self {
        self.components.insert(name.to_string(), HealthComponent { status, details });
        self
    }
}

#[async_trait]
impl HealthServiceTrait for MockHealthService {
    async fn get_system_health(&self) -> SystemHealth {
        let mut components = HashMap::new();

        components.insert(
            "database".to_string(),
            HealthComponent {
                status: self.database_status.clone(),
                details: match self.database_status {
                    ComponentStatus::Healthy => None,
                    ComponentStatus::Degraded => Some("Database is experiencing high load".to_string()),
                    ComponentStatus::Unhealthy => Some("Database connection failed".to_string()),
                },
            },
        );
        components.insert("api".to_string(), HealthComponent::healthy());

        for (name, component) in &self.components {
            components.insert(name.clone(), component.clone());
        }

        let mut health = SystemHealth::from_components(components);
        if let Some(status) = &self.system_status {
            health.status = status.clone();
        }
        health
    }

    async fn check_database_status(&self) -> Result<bool, String> {
        match self.database_status {
            ComponentStatus::Healthy => Ok(true),
            ComponentStatus::Degraded => Ok(false),
            ComponentStatus::Unhealthy => Err("Database connection failed".to_string()),
        }
    }
}

/// Factory function to create a mock health service
pub fn create_mock_health_service() -> impl HealthServiceTrait {
    MockHealthService::new()
}
