// Health Emo Cat Guide data layer
// Database access, repositories and stored report files

// Database connection management
pub mod database;

// Repository implementations for data access
pub mod repository;

// Data storage models
pub mod models;

// Uploaded report file storage
pub mod files;
