// Domain services
// Business logic for accounts, reports, questionnaires and cards.

pub mod errors;
pub mod users;
pub mod health_standards;
pub mod health_score;
pub mod gemini;
pub mod report_analysis;
pub mod health_reports;
pub mod psychology_tests;
pub mod cat_cards;

use std::sync::Arc;

use tracing::info;

use emo_cat_guide_data::files::LocalFileStore;
use emo_cat_guide_data::repository::{
    CatCardRepository, HealthReportRepository, PsychologyTestRepository, UserRepository,
};

use crate::config::AppConfig;

// Re-export service traits and factory functions
pub use errors::ServiceError;
pub use users::{create_default_user_service, UserServiceTrait};
pub use health_reports::{FileStore, HealthReportServiceTrait};
pub use psychology_tests::PsychologyTestServiceTrait;
pub use cat_cards::{featured_cats, CatCardServiceTrait};
pub use health_standards::{HealthStandards, StandardsError};

/// All application services, sharing one set of repositories
#[derive(Clone)]
pub struct AppServices {
    pub users: Arc<dyn UserServiceTrait + Send + Sync>,
    pub health_reports: Arc<dyn HealthReportServiceTrait + Send + Sync>,
    pub psychology_tests: Arc<dyn PsychologyTestServiceTrait + Send + Sync>,
    pub cat_cards: Arc<dyn CatCardServiceTrait + Send + Sync>,
}

/// Build the services with an explicit file store and optional AI backends
pub fn create_services(
    config: &AppConfig,
    files: FileStore,
    analyzer: Option<health_reports::Analyzer>,
    writer: Option<Arc<dyn cat_cards::TextGenerator>>,
) -> AppServices {
    let users = UserRepository::new();
    let reports = HealthReportRepository::new();
    let tests = PsychologyTestRepository::new();

    AppServices {
        users: Arc::new(users::UserService::new(users.clone())),
        health_reports: Arc::new(health_reports::HealthReportService::new(
            reports.clone(),
            users,
            files,
            analyzer,
            config.max_upload_bytes,
        )),
        psychology_tests: Arc::new(psychology_tests::PsychologyTestService::new(tests.clone())),
        cat_cards: Arc::new(cat_cards::CatCardService::new(CatCardRepository::new(), reports, tests, writer)),
    }
}

/// Build the services from configuration: local file storage, plus Gemini when a key is set
pub fn create_default_services(config: &AppConfig) -> Result<AppServices, StandardsError> {
    let standards = HealthStandards::load(config.health_standards_file.as_deref())?;
    let files: FileStore = Arc::new(LocalFileStore::new(config.upload_dir.clone()));

    let (analyzer, writer) = match gemini::GeminiClient::from_config(config) {
        Some(client) => {
            info!("Gemini analysis enabled with model {}", client.model());
            let analyzer: health_reports::Analyzer =
                Arc::new(report_analysis::GeminiReportAnalyzer::new(client.clone(), standards));
            let writer: Arc<dyn cat_cards::TextGenerator> = Arc::new(client);
            (Some(analyzer), Some(writer))
        },
        None => (None, None),
    };

    Ok(create_services(config, files, analyzer, writer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::RegisterRequest;
    use crate::entities::SubmitPsychologyTestRequest;
    use emo_cat_guide_data::files::InMemoryFileStore;

    #[tokio::test]
    async fn test_services_share_repositories() {
        let services = create_services(&AppConfig::default(), Arc::new(InMemoryFileStore::new()), None, None);

        let user = services.users.register(RegisterRequest {
            email: "neko@example.com".to_string(),
            password: "123456".to_string(),
            gender: None,
        }).await.unwrap();

        services.health_reports.upload(&user.id, "report.pdf", b"%PDF".to_vec()).await.unwrap();
        services.psychology_tests.submit(&user.id, SubmitPsychologyTestRequest {
            question1: "calm".to_string(),
            question2: "tea".to_string(),
        }).await.unwrap();

        let card = services.cat_cards.generate(&user.id).await.unwrap();
        assert_eq!(card.mood, "calm");
        assert_eq!(services.cat_cards.list(&user.id).await.unwrap().len(), 1);
    }

    #[test]
    fn test_default_services_without_key() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            upload_dir: dir.path().to_path_buf(),
            ..AppConfig::default()
        };
        assert!(create_default_services(&config).is_ok());
    }
}
