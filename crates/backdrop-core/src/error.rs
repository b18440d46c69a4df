//! Error types module
//!
//! This module provides the core error types used throughout Backdrop.
//! Local validation failures, upstream failures from the removal and generation
//! services, timeouts and configuration problems are unified under `AppError`.

use std::io;

/// User-facing message reported when a pipeline run exceeds its budget.
pub const TIMEOUT_MESSAGE: &str = "Request timed out. Please try again with a faster connection.";

/// Fallback message when an upstream error body carries no usable title.
pub const DEFAULT_UPSTREAM_MESSAGE: &str = "Failed to process image";

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for upstream issues the client can retry
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
/// This trait allows errors to self-describe their HTTP response characteristics
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "UPSTREAM_REJECTED")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Unsupported content type: {0}")]
    UnsupportedType(String),

    #[error("File too large: {size} bytes exceeds limit of {max} bytes")]
    SizeLimit { size: usize, max: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Upstream rejected request with status {status}: {message}")]
    UpstreamRejected { status: u16, message: String },

    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),

    #[error("Failed to generate background: {status}")]
    GenerationFailed { status: u16 },

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Compositing error: {0}")]
    Compositing(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
/// client_message stays per-variant for dynamic content.
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::Decode(_) => (
            400,
            "DECODE_ERROR",
            false,
            Some("Check image format and try a different file"),
            false,
            LogLevel::Debug,
        ),
        AppError::UnsupportedType(_) => (
            415,
            "UNSUPPORTED_TYPE",
            false,
            Some("Upload a PNG, JPEG or WEBP image"),
            false,
            LogLevel::Debug,
        ),
        AppError::SizeLimit { .. } => (
            413,
            "PAYLOAD_TOO_LARGE",
            false,
            Some("Reduce file size and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::UpstreamUnavailable(_) => (
            500,
            "UPSTREAM_UNAVAILABLE",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Warn,
        ),
        AppError::UpstreamRejected { status, .. } => (
            upstream_status(*status),
            "UPSTREAM_REJECTED",
            *status >= 500 || *status == 429,
            Some("Check the image and try again"),
            false,
            LogLevel::Warn,
        ),
        AppError::MalformedResponse(_) => (
            500,
            "MALFORMED_RESPONSE",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::GenerationFailed { .. } => (
            500,
            "GENERATION_FAILED",
            true,
            Some("Try a different prompt or retry later"),
            false,
            LogLevel::Warn,
        ),
        AppError::Timeout(_) => (
            504,
            "TIMEOUT",
            true,
            Some("Try again with a faster connection"),
            false,
            LogLevel::Warn,
        ),
        AppError::Configuration(_) => (
            500,
            "CONFIGURATION_ERROR",
            false,
            Some("Contact the server administrator"),
            false,
            LogLevel::Error,
        ),
        AppError::Compositing(_) => (
            500,
            "COMPOSITING_ERROR",
            false,
            Some("Try a different image"),
            true,
            LogLevel::Error,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

/// Upstream statuses are relayed when they are client or server errors.
fn upstream_status(status: u16) -> u16 {
    if (400..=599).contains(&status) {
        status
    } else {
        502
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Decode(_) => "Decode",
            AppError::UnsupportedType(_) => "UnsupportedType",
            AppError::SizeLimit { .. } => "SizeLimit",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::UpstreamUnavailable(_) => "UpstreamUnavailable",
            AppError::UpstreamRejected { .. } => "UpstreamRejected",
            AppError::MalformedResponse(_) => "MalformedResponse",
            AppError::GenerationFailed { .. } => "GenerationFailed",
            AppError::Timeout(_) => "Timeout",
            AppError::Configuration(_) => "Configuration",
            AppError::Compositing(_) => "Compositing",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Decode(_) => "Could not decode the uploaded image".to_string(),
            AppError::UnsupportedType(_) => "Please upload an image file".to_string(),
            AppError::SizeLimit { max, .. } => {
                format!("File size must be less than {}MB", max / (1024 * 1024))
            }
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::UpstreamUnavailable(_) => {
                "Image service is unavailable, please try again".to_string()
            }
            AppError::UpstreamRejected { ref message, .. } => message.clone(),
            AppError::MalformedResponse(_) => {
                "Image service returned an unreadable response".to_string()
            }
            AppError::GenerationFailed { status } => {
                format!("Failed to generate background: {}", status)
            }
            AppError::Timeout(_) => TIMEOUT_MESSAGE.to_string(),
            AppError::Configuration(ref msg) => msg.clone(),
            AppError::Compositing(_) => "Failed to compose the final image".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}
