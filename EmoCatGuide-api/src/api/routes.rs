use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::get,
    Extension, Router,
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::debug;

use emo_cat_guide_domain::auth::{auth_middleware, configure_auth, routes::auth_routes};
use emo_cat_guide_domain::config::AppConfig;
use emo_cat_guide_domain::services::{create_default_services, AppServices, StandardsError};

use crate::api::handlers::{cards, health, health_reports, psychology_tests};
use crate::openapi::configure_swagger_routes;

/// Room for multipart boundaries and headers on top of the file itself.
/// Files between the configured limit and this margin get the service's 413.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the application router from configuration
pub fn create_app(config: &AppConfig) -> Result<Router, StandardsError> {
    debug!("Creating application router");

    let services = create_default_services(config)?;
    let health_service = health::create_health_service(config.analysis_enabled());

    Ok(create_router(config, services, health_service))
}

/// Wire routes, middleware and documentation around the given services
pub fn create_router(config: &AppConfig, services: AppServices, health_service: health::HealthService) -> Router {
    // Routes that require an access token
    let api_routes = Router::new()
        .route(
            "/health-reports",
            get(health_reports::list_health_reports).post(health_reports::upload_health_report),
        )
        .route("/health-reports/:id", get(health_reports::get_health_report))
        .route("/health-reports/:id/file", get(health_reports::get_health_report_file))
        .route(
            "/psychology-tests",
            get(psychology_tests::list_psychology_tests).post(psychology_tests::submit_psychology_test),
        )
        .route("/cards", get(cards::list_cards).post(cards::generate_card))
        .route_layer(middleware::from_fn_with_state((), auth_middleware::<()>))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES))
        .with_state(services.clone());

    debug!("API routes configured");

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/cats/featured", get(cards::get_featured_cats))
        .layer(Extension(health_service));

    let app = Router::new()
        .merge(public_routes)
        .nest("/auth", auth_routes(services.users.clone()))
        .nest("/api/v1", api_routes)
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .merge(configure_swagger_routes());

    debug!("Routes merged");

    let app = configure_auth(app).layer(TraceLayer::new_for_http());

    health::initialize_server_start_time();

    app
}
