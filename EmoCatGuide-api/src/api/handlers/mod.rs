pub mod health;
pub mod health_reports;
pub mod psychology_tests;
pub mod cards;

// Tests module
#[cfg(test)]
mod tests;

// Re-export handlers for easier imports
pub use cards::{generate_card, get_featured_cats, list_cards};
pub use health::health_check;
pub use health_reports::{get_health_report, get_health_report_file, list_health_reports, upload_health_report};
pub use psychology_tests::{list_psychology_tests, submit_psychology_test};
