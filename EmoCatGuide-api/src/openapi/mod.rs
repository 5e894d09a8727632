use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Configure Swagger UI endpoints
pub fn configure_swagger_routes() -> SwaggerUi {
    SwaggerUi::new("/api-docs")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
}

// API Documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health endpoints
        crate::api::handlers::health::health_check,

        // Report endpoints
        crate::api::handlers::health_reports::upload_health_report,
        crate::api::handlers::health_reports::list_health_reports,
        crate::api::handlers::health_reports::get_health_report,
        crate::api::handlers::health_reports::get_health_report_file,

        // Questionnaire endpoints
        crate::api::handlers::psychology_tests::submit_psychology_test,
        crate::api::handlers::psychology_tests::list_psychology_tests,

        // Card endpoints
        crate::api::handlers::cards::generate_card,
        crate::api::handlers::cards::list_cards,
        crate::api::handlers::cards::get_featured_cats,

        // Auth endpoints
        emo_cat_guide_domain::auth::routes::register,
        emo_cat_guide_domain::auth::routes::login,
        emo_cat_guide_domain::auth::routes::refresh_token,
        emo_cat_guide_domain::auth::routes::logout,
        emo_cat_guide_domain::auth::routes::auth_info
    ),
    components(
        schemas(
            crate::entities::common::ErrorResponse,
            crate::entities::responses::ReportUploadResponse,
            crate::entities::responses::PsychologyTestResponse,
            crate::entities::responses::CatCardResponse,

            crate::api::handlers::health::HealthResponse,
            crate::api::handlers::health::ComponentStatus,
            crate::api::handlers::health::ComponentHealthStatus,

            emo_cat_guide_domain::entities::HealthReport,
            emo_cat_guide_domain::entities::FileType,
            emo_cat_guide_domain::entities::AnalysisStatus,
            emo_cat_guide_domain::entities::PsychologyTest,
            emo_cat_guide_domain::entities::SubmitPsychologyTestRequest,
            emo_cat_guide_domain::entities::CatCard,
            emo_cat_guide_domain::entities::FeaturedCat,
            emo_cat_guide_domain::entities::Gender,
            emo_cat_guide_domain::entities::User,

            emo_cat_guide_domain::auth::RegisterRequest,
            emo_cat_guide_domain::auth::LoginRequest,
            emo_cat_guide_domain::auth::AuthResponse,
            emo_cat_guide_domain::auth::RefreshResponse,
            emo_cat_guide_domain::auth::UserInfo,
            emo_cat_guide_domain::auth::Claims
        )
    ),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "health_reports", description = "Health examination report upload and analysis"),
        (name = "psychology_tests", description = "Emo Guide questionnaire"),
        (name = "cards", description = "Cat companion cards"),
        (name = "Authentication", description = "Registration, login and token endpoints")
    ),
    info(
        title = "Health Emo Cat Guide API",
        version = "0.1.0",
        description = "Health report analysis with emotional support from cat companions",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        ),
    ),
    servers(
        (url = "/", description = "Local development server")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_doc_generation() {
        let openapi = ApiDoc::openapi();

        assert_eq!(openapi.info.title, "Health Emo Cat Guide API");
        assert_eq!(openapi.info.version, "0.1.0");

        let tags = openapi.tags.as_ref().unwrap();
        assert!(tags.iter().any(|tag| tag.name == "health_reports"));
        assert!(tags.iter().any(|tag| tag.name == "Authentication"));

        for path in [
            "/health",
            "/cats/featured",
            "/auth/register",
            "/auth/login",
            "/auth/refresh",
            "/auth/logout",
            "/auth/info",
            "/api/v1/health-reports",
            "/api/v1/health-reports/{id}",
            "/api/v1/health-reports/{id}/file",
            "/api/v1/psychology-tests",
            "/api/v1/cards",
        ] {
            assert!(openapi.paths.paths.contains_key(path), "missing path {}", path);
        }
    }
}
