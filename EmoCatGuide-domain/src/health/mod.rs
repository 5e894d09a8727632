//! System status for the health endpoint

use std::collections::HashMap;

use async_trait::async_trait;
use emo_cat_guide_data::database;

/// System health status
#[derive(Debug, Clone, PartialEq)]
pub enum SystemStatus {
    /// All components are healthy
    Healthy,
    /// Some components are degraded but the system is functional
    Degraded,
    /// System is not functioning properly
    Unhealthy,
}

/// Component health status
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Represents a health component with status and optional details
#[derive(Debug, Clone)]
pub struct HealthComponent {
    pub status: ComponentStatus,
    pub details: Option<String>,
}

impl HealthComponent {
    pub fn healthy() -> Self {
        Self { status: ComponentStatus::Healthy, details: None }
    }
}

/// Represents the overall health of the system
#[derive(Debug, Clone)]
pub struct SystemHealth {
    pub status: SystemStatus,
    /// Component name → status
    pub components: HashMap<String, HealthComponent>,
}

impl SystemHealth {
    /// Overall status is the worst component status
    pub fn from_components(components: HashMap<String, HealthComponent>) -> Self {
        let status = if components.values().any(|c| c.status == ComponentStatus::Unhealthy) {
            SystemStatus::Unhealthy
        } else if components.values().any(|c| c.status == ComponentStatus::Degraded) {
            SystemStatus::Degraded
        } else {
            SystemStatus::Healthy
        };

        Self { status, components }
    }
}

/// Trait for health services
#[async_trait]
pub trait HealthServiceTrait: Send + Sync + std::fmt::Debug {
    /// Get the overall system health
    async fn get_system_health(&self) -> SystemHealth;

    /// Check the status of the database.
    /// `Ok(false)` means degraded, `Err` means unavailable.
    async fn check_database_status(&self) -> Result<bool, String>;
}

/// Check if the database is available and functioning properly
///
/// Returns:
/// - Ok(true) if the database is fully operational
/// - Ok(false) if the database has degraded functionality
/// - Err if the database is completely unavailable
pub async fn check_database_status() -> Result<bool, String> {
    match database::get_connection_info() {
        Some(info) => Ok(info.contains("healthy")),
        None => match database::get_db_pool() {
            Ok(_) => Ok(true),
            Err(e) => Err(format!("Database connection error: {}", e)),
        },
    }
}

/// Database component for a status check result
pub fn database_component(db_status: Result<bool, String>) -> HealthComponent {
    match db_status {
        Ok(true) => HealthComponent::healthy(),
        Ok(false) => HealthComponent {
            status: ComponentStatus::Degraded,
            details: Some("Database is available but has performance issues".to_string()),
        },
        Err(e) => HealthComponent {
            status: ComponentStatus::Unhealthy,
            details: Some(e),
        },
    }
}

/// Report analysis component. Running without an AI key is a supported mode.
pub fn analysis_component(analysis_enabled: bool) -> HealthComponent {
    HealthComponent {
        status: ComponentStatus::Healthy,
        details: (!analysis_enabled).then(|| "GEMINI_API_KEY not set, report analysis is skipped".to_string()),
    }
}

/// Get overall system health
pub async fn get_system_health(analysis_enabled: bool) -> SystemHealth {
    let components: HashMap<String, HealthComponent> = vec![
        ("database".to_string(), database_component(check_database_status().await)),
        ("api".to_string(), HealthComponent::healthy()),
        ("analysis".to_string(), analysis_component(analysis_enabled)),
    ]
    .into_iter()
    .collect();

    SystemHealth::from_components(components)
}
