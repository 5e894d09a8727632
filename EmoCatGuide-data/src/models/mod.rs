// Storage models, one per table
pub mod user;
pub mod health_report;
pub mod psychology_test;
pub mod cat_card;
