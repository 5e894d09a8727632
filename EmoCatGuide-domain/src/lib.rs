// Health Emo Cat Guide Domain
// Business logic for the Health Emo Cat Guide application

// Runtime configuration
pub mod config;

// Services that implement business logic
pub mod services;

// Authentication
pub mod auth;

// Domain entities
pub mod entities;

// Health checks and system status
pub mod health;

// Re-export the database module from the data crate for convenience
pub use emo_cat_guide_data::database;

// Testing utilities - only available with mock feature
#[cfg(feature = "mock")]
pub mod testing;
