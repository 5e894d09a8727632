use axum::{http::StatusCode, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use std::time::{SystemTime, UNIX_EPOCH};
use std::sync::{Arc, Once};
use once_cell::sync::OnceCell;
use async_trait::async_trait;

use emo_cat_guide_domain::health::{
    self, ComponentStatus as DomainComponentStatus, HealthComponent as DomainHealthComponent,
    HealthServiceTrait, SystemHealth, SystemStatus,
};

pub type HealthService = Arc<dyn HealthServiceTrait + Send + Sync>;

/// Health check response with system information
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Current service status ("ok", "degraded", or "error")
    pub status: String,
    /// Current application version from Cargo manifest
    pub version: String,
    /// Timestamp of when the response was generated
    pub timestamp: u64,
    /// Uptime of the service in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
    pub components: ComponentStatus,
    pub environment: String,
}

/// Status of individual system components
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ComponentStatus {
    pub database: ComponentHealthStatus,
    pub api: ComponentHealthStatus,
    /// Other components, such as report analysis
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub additional: Option<serde_json::Value>,
}

/// Health status for an individual component
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ComponentHealthStatus {
    /// Status of the component ("ok", "degraded", or "error")
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

static SERVER_START_TIME: OnceCell<u64> = OnceCell::new();
static INIT: Once = Once::new();

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

pub fn initialize_server_start_time() {
    INIT.call_once(|| {
        let _ = SERVER_START_TIME.set(now_secs());
    });
}

/// Health check endpoint to verify the API is running
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "API is healthy", body = HealthResponse),
        (status = 500, description = "API is not healthy", body = HealthResponse),
        (status = 503, description = "API is degraded", body = HealthResponse)
    ),
    tag = "health"
)]
#[instrument(skip(health_service))]
pub async fn health_check(Extension(health_service): Extension<HealthService>) -> impl IntoResponse {
    info!("Health check requested");

    let now = now_secs();
    let uptime = SERVER_START_TIME.get().map(|&start_time| now.saturating_sub(start_time));

    let system_health = health_service.get_system_health().await;
    let overall_status = match system_health.status {
        SystemStatus::Healthy => "ok",
        SystemStatus::Degraded => "degraded",
        SystemStatus::Unhealthy => "error",
    };

    let response = HealthResponse {
        status: overall_status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: now,
        uptime,
        components: component_statuses(&system_health),
        environment: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
    };

    let status = match system_health.status {
        SystemStatus::Healthy => StatusCode::OK,
        SystemStatus::Degraded => StatusCode::SERVICE_UNAVAILABLE,
        SystemStatus::Unhealthy => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, Json(response))
}

fn component_health(component: Option<&DomainHealthComponent>) -> ComponentHealthStatus {
    match component {
        Some(component) => ComponentHealthStatus {
            status: map_component_status(&component.status),
            message: component.details.clone(),
        },
        None => ComponentHealthStatus {
            status: map_component_status(&DomainComponentStatus::Healthy),
            message: None,
        },
    }
}

fn component_statuses(system_health: &SystemHealth) -> ComponentStatus {
    let additional: serde_json::Map<String, serde_json::Value> = system_health
        .components
        .iter()
        .filter(|(name, _)| name.as_str() != "database" && name.as_str() != "api")
        .map(|(name, component)| {
            (name.clone(), serde_json::json!({
                "status": map_component_status(&component.status),
                "message": component.details,
            }))
        })
        .collect();

    ComponentStatus {
        database: component_health(system_health.components.get("database")),
        api: component_health(system_health.components.get("api")),
        additional: (!additional.is_empty()).then(|| additional.into()),
    }
}

fn map_component_status(status: &DomainComponentStatus) -> String {
    match status {
        DomainComponentStatus::Healthy => "ok",
        DomainComponentStatus::Degraded => "degraded",
        DomainComponentStatus::Unhealthy => "error",
    }
    .to_string()
}

/// Health service backed by the live database pool
#[derive(Debug)]
pub struct SystemHealthService {
    analysis_enabled: bool,
}

impl SystemHealthService {
    pub fn new(analysis_enabled: bool) -> Self {
        Self { analysis_enabled }
    }
}

#[async_trait]
impl HealthServiceTrait for SystemHealthService {
    async fn get_system_health(&self) -> SystemHealth {
        health::get_system_health(self.analysis_enabled).await
    }

    async fn check_database_status(&self) -> Result<bool, String> {
        health::check_database_status().await
    }
}

pub fn create_health_service(analysis_enabled: bool) -> HealthService {
    Arc::new(SystemHealthService::new(analysis_enabled))
}
