pub mod handlers;
pub mod routes;

use axum::Router;

use emo_cat_guide_domain::config::AppConfig;
use emo_cat_guide_domain::services::StandardsError;

/// Create the application router
pub fn create_application(config: &AppConfig) -> Result<Router, StandardsError> {
    routes::create_app(config)
}
