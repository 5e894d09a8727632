// Public entities for the Health Emo Cat Guide API
// Structures that only exist at the HTTP boundary

// Error response shared by all handlers
pub mod common;

// Success envelopes carrying the next step hint
pub mod responses;

pub use common::ErrorResponse;
