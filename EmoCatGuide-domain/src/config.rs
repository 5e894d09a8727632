//! Application configuration loaded from the environment

use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

/// Default Gemini model used for report extraction and card feedback
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Default Gemini REST endpoint
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Largest accepted report upload
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Runtime settings for the server and its services
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP port
    pub port: u16,
    /// Root directory for local data
    pub data_dir: PathBuf,
    /// Directory holding uploaded report files
    pub upload_dir: PathBuf,
    /// Directory served under `/static` (cat illustrations)
    pub static_dir: PathBuf,
    /// Upload size limit in bytes
    pub max_upload_bytes: usize,
    /// Gemini API key. Report analysis is skipped without one.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_api_base: String,
    /// Health standards override file
    pub health_standards_file: Option<PathBuf>,
    /// Deployment environment name
    pub app_env: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            data_dir: PathBuf::from("data"),
            upload_dir: PathBuf::from("data").join("uploads"),
            static_dir: PathBuf::from("static"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            health_standards_file: None,
            app_env: "development".to_string(),
        }
    }
}

impl AppConfig {
    /// Build the configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = match env::var("PORT") {
            Ok(value) => value.parse::<u16>().unwrap_or_else(|_| {
                warn!("Invalid PORT value {:?}, using {}", value, defaults.port);
                defaults.port
            }),
            Err(_) => defaults.port,
        };

        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let upload_dir = env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("uploads"));

        let max_upload_bytes = env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(defaults.max_upload_bytes);

        let gemini_api_key = env::var("GEMINI_API_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        if gemini_api_key.is_none() {
            warn!("GEMINI_API_KEY not set, health report analysis will be skipped");
        }

        let config = Self {
            port,
            data_dir,
            upload_dir,
            static_dir: env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            max_upload_bytes,
            gemini_api_key,
            gemini_model: env::var("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_api_base: env::var("GEMINI_API_BASE").unwrap_or(defaults.gemini_api_base),
            health_standards_file: env::var("HEALTH_STANDARDS_FILE").ok().map(PathBuf::from),
            app_env: env::var("APP_ENV").unwrap_or(defaults.app_env),
        };

        info!(
            "Configuration loaded: port={}, upload_dir={:?}, max_upload_bytes={}, model={}, env={}",
            config.port, config.upload_dir, config.max_upload_bytes, config.gemini_model, config.app_env
        );

        config
    }

    /// Whether report analysis can call the AI service
    pub fn analysis_enabled(&self) -> bool {
        self.gemini_api_key.is_some()
    }
}
