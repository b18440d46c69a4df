//! Backdrop API Library
//!
//! This crate provides the HTTP proxy in front of the removal and generation
//! services: handlers, middleware, and application setup.

// Module declarations
mod api_doc;
pub mod constants;
mod handlers;
mod middleware;
pub mod setup;
mod telemetry;

// Public modules
pub mod error;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
