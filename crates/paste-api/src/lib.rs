//! Pastebin REST API
//!
//! This crate provides the Axum-based HTTP surface over the paste engine.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
