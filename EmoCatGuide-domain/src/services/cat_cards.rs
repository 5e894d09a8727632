//! Cat companion cards.
//!
//! A card pairs one cat from the nine-grid catalog with a feedback message. The
//! cat is picked from the mood of the latest questionnaire and the score of the
//! latest health report.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use emo_cat_guide_data::models::cat_card::NewCatCard;
use emo_cat_guide_data::repository::{
    CatCardRepositoryTrait, HealthReportRepositoryTrait, PsychologyTestRepositoryTrait,
};

use crate::entities::conversions::convert_to_domain_cat_card;
use crate::entities::{CatCard, FeaturedCat, Mood};
use crate::services::errors::ServiceError;
use crate::services::gemini::{GeminiClient, GeminiError};

pub const UPLOAD_REPORT_FIRST: &str = "Please upload your health report first";
pub const TAKE_TEST_FIRST: &str = "Please complete the psychology test first";

/// Where cat illustrations are served from
const CAT_IMAGE_PATH: &str = "/static/cats";

/// (id, name, personality)
const CATALOG: [(&str, &str, &str); 9] = [
    ("orange_tabby", "Mikan", "Sunny and playful, always ready to celebrate the small wins"),
    ("blue_grey", "Sora", "Quiet and steady, a calm presence on busy days"),
    ("tuxedo", "Oreo", "Organized and reassuring, good at turning worries into plans"),
    ("calico", "Mochi", "Warm and cheerful, loves sharing a good mood"),
    ("siamese", "Luna", "Chatty and curious, keeps you gently on track"),
    ("black", "Kuro", "Loyal night owl who sits with you when things feel heavy"),
    ("white", "Yuki", "Soft and sleepy, an expert in rest and recovery"),
    ("tabby", "Tora", "Down to earth and dependable, happy with simple routines"),
    ("ragdoll", "Momo", "Gentle caretaker who never leaves your side"),
];

/// The nine-grid catalog of cat companions
pub fn featured_cats() -> Vec<FeaturedCat> {
    CATALOG
        .iter()
        .map(|(id, name, personality)| FeaturedCat {
            id: id.to_string(),
            name: name.to_string(),
            personality: personality.to_string(),
            image_url: format!("{}/{}.png", CAT_IMAGE_PATH, id),
        })
        .collect()
}

fn featured_cat(id: &str) -> FeaturedCat {
    featured_cats()
        .into_iter()
        .find(|cat| cat.id == id)
        .unwrap_or_else(|| FeaturedCat {
            id: id.to_string(),
            name: id.to_string(),
            personality: String::new(),
            image_url: format!("{}/{}.png", CAT_IMAGE_PATH, id),
        })
}

const MOOD_KEYWORDS: [(Mood, &[&str]); 5] = [
    (Mood::Anxious, &["anxious", "worried", "worry", "stress", "nervous", "panic", "焦慮", "緊張", "壓力", "擔心"]),
    (Mood::Sad, &["sad", "down", "lonely", "depressed", "cry", "upset", "難過", "傷心", "孤單", "憂鬱"]),
    (Mood::Tired, &["tired", "exhausted", "sleepy", "burned out", "burnt out", "fatigue", "累", "疲憊", "想睡"]),
    (Mood::Happy, &["happy", "great", "excited", "joy", "wonderful", "good", "開心", "快樂", "興奮"]),
    (Mood::Calm, &["calm", "relaxed", "peaceful", "fine", "okay", "ok", "平靜", "放鬆"]),
];

/// Mood read from the questionnaire answers. The first matching mood in
/// anxious, sad, tired, happy, calm order wins.
pub fn detect_mood(question1: &str, question2: &str) -> Mood {
    let text = format!("{} {}", question1, question2).to_lowercase();
    let words: Vec<&str> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect();

    MOOD_KEYWORDS
        .iter()
        .find(|(_, keywords)| {
            keywords.iter().any(|keyword| {
                if keyword.is_ascii() && !keyword.contains(' ') {
                    words.contains(keyword)
                } else {
                    text.contains(keyword)
                }
            })
        })
        .map(|(mood, _)| *mood)
        .unwrap_or(Mood::Neutral)
}

/// Companion for a mood and health score. Missing scores count as middling.
pub fn select_cat(mood: Mood, health_score: Option<u8>) -> &'static str {
    // (high, middle, low) score picks
    let (high, middle, low) = match mood {
        Mood::Happy => ("orange_tabby", "calico", "tabby"),
        Mood::Calm => ("blue_grey", "siamese", "white"),
        Mood::Tired => ("white", "ragdoll", "ragdoll"),
        Mood::Anxious => ("tuxedo", "blue_grey", "ragdoll"),
        Mood::Sad => ("calico", "black", "ragdoll"),
        Mood::Neutral => ("tabby", "tuxedo", "black"),
    };

    match health_score {
        Some(score) if score >= 85 => high,
        Some(score) if score < 60 => low,
        _ => middle,
    }
}

fn mood_tip(mood: Mood) -> &'static str {
    match mood {
        Mood::Happy => "Keep that energy going and share it with someone today.",
        Mood::Calm => "Enjoy the calm and keep your steady routine.",
        Mood::Tired => "Give yourself permission to rest early tonight.",
        Mood::Anxious => "Try a few slow breaths and take things one step at a time.",
        Mood::Sad => "It is okay to feel down. Reach out to someone you trust.",
        Mood::Neutral => "A short walk and a glass of water can brighten the day.",
    }
}

/// Feedback used when no text generator is available
pub fn template_feedback(cat: &FeaturedCat, mood: Mood, health_score: Option<u8>, warnings: &[String]) -> String {
    let mut parts = vec![format!("{} noticed you are feeling {}.", cat.name, mood.as_str())];

    match health_score {
        Some(score) if score >= 85 => parts.push(format!("Your health score is {}/100, great work looking after yourself!", score)),
        Some(score) if score >= 60 => parts.push(format!("Your health score is {}/100, a few habits could use some love.", score)),
        Some(score) => parts.push(format!("Your health score is {}/100, please consider talking with a doctor about your results.", score)),
        None => parts.push("Your report is saved, and a score will appear once it has been analyzed.".to_string()),
    }

    if let Some(first) = warnings.first() {
        parts.push(format!("Keep an eye on this: {}.", first));
    }

    parts.push(mood_tip(mood).to_string());
    parts.join(" ")
}

/// Prompt for AI-written feedback
pub fn feedback_prompt(cat: &FeaturedCat, mood: Mood, health_score: Option<u8>, warnings: &[String], answers: (&str, &str)) -> String {
    let score = health_score.map(|s| format!("{}/100", s)).unwrap_or_else(|| "not available".to_string());
    let findings = if warnings.is_empty() {
        "none".to_string()
    } else {
        warnings.iter().take(3).cloned().collect::<Vec<_>>().join("; ")
    };

    format!(
        "You are {name}, a cat companion. Personality: {personality}.\n\
         Write a warm, encouraging message of 3 to 4 sentences to the user, speaking as the cat.\n\
         Do not give a diagnosis and do not mention that you are an AI.\n\n\
         Mood: {mood}\n\
         Health score: {score}\n\
         Notable findings: {findings}\n\
         How the user feels: {q1}\n\
         What would help the user: {q2}\n",
        name = cat.name,
        personality = cat.personality,
        mood = mood.as_str(),
        score = score,
        findings = findings,
        q1 = answers.0,
        q2 = answers.1,
    )
}

/// Free-text generation used for card feedback
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(&self, prompt: &str) -> Result<String, GeminiError>;
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate_text(&self, prompt: &str) -> Result<String, GeminiError> {
        GeminiClient::generate_text(self, prompt).await
    }
}

/// Cat card operations
#[async_trait]
pub trait CatCardServiceTrait {
    /// Build a card from the latest report and questionnaire
    async fn generate(&self, user_id: &str) -> Result<CatCard, ServiceError>;

    /// Cards of a user, newest first
    async fn list(&self, user_id: &str) -> Result<Vec<CatCard>, ServiceError>;
}

pub struct CatCardService<C, R, P>
where
    C: CatCardRepositoryTrait,
    R: HealthReportRepositoryTrait,
    P: PsychologyTestRepositoryTrait,
{
    cards: C,
    reports: R,
    tests: P,
    writer: Option<Arc<dyn TextGenerator>>,
}

impl<C, R, P> CatCardService<C, R, P>
where
    C: CatCardRepositoryTrait,
    R: HealthReportRepositoryTrait,
    P: PsychologyTestRepositoryTrait,
{
    pub fn new(cards: C, reports: R, tests: P, writer: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { cards, reports, tests, writer }
    }
}

#[async_trait]
impl<C, R, P> CatCardServiceTrait for CatCardService<C, R, P>
where
    C: CatCardRepositoryTrait + Send + Sync,
    R: HealthReportRepositoryTrait + Send + Sync,
    P: PsychologyTestRepositoryTrait + Send + Sync,
{
    async fn generate(&self, user_id: &str) -> Result<CatCard, ServiceError> {
        let report = self
            .reports
            .list_by_user(user_id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::Precondition(UPLOAD_REPORT_FIRST.to_string()))?;

        let test = self
            .tests
            .list_by_user(user_id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::Precondition(TAKE_TEST_FIRST.to_string()))?;

        let mood = detect_mood(&test.question1, &test.question2);
        let cat = featured_cat(select_cat(mood, report.health_score));

        let feedback = match &self.writer {
            Some(writer) => {
                let prompt = feedback_prompt(&cat, mood, report.health_score, &report.warnings, (&test.question1, &test.question2));
                match writer.generate_text(&prompt).await {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("Feedback generation failed, using template: {}", e);
                        template_feedback(&cat, mood, report.health_score, &report.warnings)
                    }
                }
            },
            None => template_feedback(&cat, mood, report.health_score, &report.warnings),
        };

        let record = self.cards.create(NewCatCard {
            user_id: user_id.to_string(),
            cat: cat.id.clone(),
            title: format!("{} is here for you", cat.name),
            image_url: cat.image_url.clone(),
            feedback,
            mood: mood.as_str().to_string(),
            health_score: report.health_score,
        }).await?;

        info!("Generated {} card {} for user {}", record.cat, record.id, user_id);
        Ok(convert_to_domain_cat_card(record))
    }

    async fn list(&self, user_id: &str) -> Result<Vec<CatCard>, ServiceError> {
        let records = self.cards.list_by_user(user_id).await?;
        Ok(records.into_iter().map(convert_to_domain_cat_card).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emo_cat_guide_data::models::health_report::NewHealthReport;
    use emo_cat_guide_data::models::psychology_test::NewPsychologyTest;
    use emo_cat_guide_data::repository::{CatCardRepository, HealthReportRepository, PsychologyTestRepository};

    type Service = CatCardService<CatCardRepository, HealthReportRepository, PsychologyTestRepository>;

    fn service(writer: Option<Arc<dyn TextGenerator>>) -> (Service, HealthReportRepository, PsychologyTestRepository) {
        let reports = HealthReportRepository::new();
        let tests = PsychologyTestRepository::new();
        let service = CatCardService::new(CatCardRepository::new(), reports.clone(), tests.clone(), writer);
        (service, reports, tests)
    }

    async fn add_report(reports: &HealthReportRepository, user_id: &str, score: Option<u8>) {
        reports.create(NewHealthReport {
            user_id: user_id.to_string(),
            filename: "r.pdf".to_string(),
            storage_path: format!("health_reports/{}/r.pdf", user_id),
            file_type: "pdf".to_string(),
            analysis_status: "completed".to_string(),
            report_date: None,
            vital_stats: None,
            health_score: score,
            warnings: vec!["Fasting glucose is grade A (110)".to_string()],
        }).await.unwrap();
    }

    async fn add_test(tests: &PsychologyTestRepository, user_id: &str, q1: &str) {
        tests.create(NewPsychologyTest {
            user_id: user_id.to_string(),
            question1: q1.to_string(),
            question2: "a warm drink".to_string(),
        }).await.unwrap();
    }

    #[test]
    fn test_catalog_has_nine_unique_cats() {
        let cats = featured_cats();
        assert_eq!(cats.len(), 9);
        let mut ids: Vec<&str> = cats.iter().map(|c| c.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 9);
        assert!(cats.iter().all(|c| c.image_url.ends_with(&format!("{}.png", c.id))));
    }

    #[test]
    fn test_detect_mood() {
        assert_eq!(detect_mood("I'm so stressed and worried", "sleep"), Mood::Anxious);
        assert_eq!(detect_mood("Feeling down today", "a hug"), Mood::Sad);
        assert_eq!(detect_mood("Exhausted", "coffee"), Mood::Tired);
        assert_eq!(detect_mood("Pretty happy!", "nothing"), Mood::Happy);
        assert_eq!(detect_mood("calm", "tea"), Mood::Calm);
        assert_eq!(detect_mood("最近壓力很大", "休息"), Mood::Anxious);
        assert_eq!(detect_mood("hmm", "dunno"), Mood::Neutral);
        // Whole words only
        assert_eq!(detect_mood("downtown goodness", "okra"), Mood::Neutral);
    }

    #[test]
    fn test_select_cat() {
        assert_eq!(select_cat(Mood::Happy, Some(95)), "orange_tabby");
        assert_eq!(select_cat(Mood::Happy, Some(70)), "calico");
        assert_eq!(select_cat(Mood::Happy, Some(40)), "tabby");
        assert_eq!(select_cat(Mood::Sad, None), "black");
        assert_eq!(select_cat(Mood::Tired, Some(85)), "white");
        assert_eq!(select_cat(Mood::Anxious, Some(59)), "ragdoll");
    }

    #[test]
    fn test_template_feedback() {
        let cat = featured_cat("orange_tabby");
        let text = template_feedback(&cat, Mood::Tired, Some(72), &["BMI is grade A (25)".to_string()]);
        assert!(text.starts_with("Mikan noticed you are feeling tired."));
        assert!(text.contains("72/100"));
        assert!(text.contains("BMI is grade A (25)"));
        assert!(text.ends_with(mood_tip(Mood::Tired)));
    }

    #[tokio::test]
    async fn test_generate_requires_report_then_test() {
        let (service, reports, tests) = service(None);

        let no_report = service.generate("u1").await;
        assert!(matches!(no_report, Err(ServiceError::Precondition(msg)) if msg == UPLOAD_REPORT_FIRST));

        // A questionnaire alone is not enough
        add_test(&tests, "u1", "happy").await;
        let still_no_report = service.generate("u1").await;
        assert!(matches!(still_no_report, Err(ServiceError::Precondition(msg)) if msg == UPLOAD_REPORT_FIRST));

        add_report(&reports, "u2", Some(90)).await;
        let no_test = service.generate("u2").await;
        assert!(matches!(no_test, Err(ServiceError::Precondition(msg)) if msg == TAKE_TEST_FIRST));
    }

    #[tokio::test]
    async fn test_generate_with_template() {
        let (service, reports, tests) = service(None);
        add_report(&reports, "u1", Some(92)).await;
        add_test(&tests, "u1", "really happy").await;

        let card = service.generate("u1").await.unwrap();
        assert_eq!(card.cat, "orange_tabby");
        assert_eq!(card.mood, "happy");
        assert_eq!(card.title, "Mikan is here for you");
        assert_eq!(card.health_score, Some(92));
        assert!(card.feedback.contains("92/100"));

        let cards = service.list("u1").await.unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].id, card.id);
    }

    #[tokio::test]
    async fn test_generate_with_ai_feedback() {
        let mut writer = MockTextGenerator::new();
        writer
            .expect_generate_text()
            .withf(|prompt| prompt.contains("You are Yuki") && prompt.contains("Mood: tired"))
            .times(1)
            .returning(|_| Ok("Purr. Rest up, friend.".to_string()));

        let (service, reports, tests) = service(Some(Arc::new(writer)));
        add_report(&reports, "u1", Some(88)).await;
        add_test(&tests, "u1", "so tired").await;

        let card = service.generate("u1").await.unwrap();
        assert_eq!(card.cat, "white");
        assert_eq!(card.feedback, "Purr. Rest up, friend.");
    }

    #[tokio::test]
    async fn test_ai_failure_falls_back_to_template() {
        let mut writer = MockTextGenerator::new();
        writer
            .expect_generate_text()
            .returning(|_| Err(GeminiError::EmptyResponse));

        let (service, reports, tests) = service(Some(Arc::new(writer)));
        add_report(&reports, "u1", None).await;
        add_test(&tests, "u1", "meh").await;

        let card = service.generate("u1").await.unwrap();
        assert_eq!(card.mood, "neutral");
        assert_eq!(card.cat, "tuxedo");
        assert!(card.feedback.starts_with("Oreo noticed you are feeling neutral."));
    }
}
