// Domain entities and value objects
pub mod user;
pub mod health_report;
pub mod psychology_test;
pub mod cat_card;
pub mod conversions;

// Re-export common types for easier imports
pub use user::{Gender, User};
pub use health_report::{AnalysisStatus, FileType, HealthReport, ReportAnalysis, ReportFile};
pub use psychology_test::{PsychologyTest, SubmitPsychologyTestRequest};
pub use cat_card::{CatCard, FeaturedCat, Mood};
