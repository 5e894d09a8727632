// EmoCatGuide-api lib.rs
//
// HTTP layer of the Health Emo Cat Guide: routes, handlers and API docs.

pub mod api;
pub mod entities;
pub mod openapi;

pub use api::create_application;
pub use api::routes::create_router;
