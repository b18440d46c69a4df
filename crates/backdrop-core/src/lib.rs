//! Backdrop Core Library
//!
//! This crate provides configuration, the unified error taxonomy, wire models and
//! data-URL helpers shared by every Backdrop component.

pub mod config;
pub mod constants;
pub mod data_url;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{BackdropConfig, BaseConfig, Config};
pub use data_url::DataUrl;
pub use error::{AppError, ErrorMetadata, LogLevel};
