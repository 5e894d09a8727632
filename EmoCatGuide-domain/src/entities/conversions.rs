use emo_cat_guide_data::models::{
    cat_card::CatCardRecord,
    health_report::HealthReportRecord,
    psychology_test::PsychologyTestRecord,
    user::UserRecord,
};
use tracing::warn;

use crate::entities::{
    AnalysisStatus, CatCard, FileType, Gender, HealthReport, PsychologyTest, User,
};

// Conversion functions between domain entities and data models
// These functions follow the pattern convert_to_[target_layer]_[model_name]

/// Convert a stored user to the domain entity. The password hash is dropped.
pub fn convert_to_domain_user(record: UserRecord) -> User {
    User {
        id: record.id,
        email: record.email,
        gender: record.gender.as_deref().and_then(Gender::parse),
        created_at: record.created_at,
        last_login: record.last_login,
    }
}

/// Convert a stored health report to the domain entity
pub fn convert_to_domain_health_report(record: HealthReportRecord) -> HealthReport {
    let file_type = match record.file_type.as_str() {
        "image" => FileType::Image,
        _ => FileType::Pdf,
    };

    let analysis_status = AnalysisStatus::parse(&record.analysis_status).unwrap_or_else(|| {
        warn!("Unknown analysis status {:?} on report {}", record.analysis_status, record.id);
        AnalysisStatus::Failed
    });

    HealthReport {
        id: record.id,
        user_id: record.user_id,
        filename: record.filename,
        storage_path: record.storage_path,
        file_type,
        upload_time: record.upload_time,
        analysis_status,
        report_date: record.report_date,
        vital_stats: record.vital_stats,
        health_score: record.health_score,
        warnings: record.warnings,
    }
}

pub fn convert_to_domain_psychology_test(record: PsychologyTestRecord) -> PsychologyTest {
    PsychologyTest {
        id: record.id,
        user_id: record.user_id,
        question1: record.question1,
        question2: record.question2,
        submit_time: record.submit_time,
    }
}

pub fn convert_to_domain_cat_card(record: CatCardRecord) -> CatCard {
    CatCard {
        id: record.id,
        user_id: record.user_id,
        cat: record.cat,
        title: record.title,
        image_url: record.image_url,
        feedback: record.feedback,
        mood: record.mood,
        health_score: record.health_score,
        created_at: record.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_convert_to_domain_user_drops_hash() {
        let record = UserRecord {
            id: "u1".to_string(),
            email: "mochi@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            gender: Some("Male".to_string()),
            created_at: "2024-05-01T08:00:00Z".to_string(),
            last_login: None,
        };

        let user = convert_to_domain_user(record);
        assert_eq!(user.gender, Some(Gender::Male));
        assert!(user.last_login.is_none());
        let serialized = serde_json::to_string(&user).unwrap();
        assert!(!serialized.contains("argon2"));
    }

    #[test]
    fn test_convert_to_domain_health_report() {
        let record = HealthReportRecord {
            id: "r1".to_string(),
            user_id: "u1".to_string(),
            filename: "scan.png".to_string(),
            storage_path: "health_reports/u1/20240501_080000_scan.png".to_string(),
            file_type: "image".to_string(),
            upload_time: "2024-05-01T08:00:00Z".to_string(),
            analysis_status: "completed".to_string(),
            report_date: Some("2024/05/01".to_string()),
            vital_stats: Some(json!({"glucose": 92})),
            health_score: Some(100),
            warnings: vec![],
        };

        let report = convert_to_domain_health_report(record);
        assert_eq!(report.file_type, FileType::Image);
        assert_eq!(report.analysis_status, AnalysisStatus::Completed);
        assert_eq!(report.vital_stats, Some(json!({"glucose": 92})));
    }
}
