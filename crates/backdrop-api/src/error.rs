//! HTTP error response conversion
//!
//! Handlers return `Result<_, HttpAppError>`. Anything that converts into
//! `AppError` (validation, processing and pipeline errors) renders through a
//! single `IntoResponse` impl so status, body and logging stay consistent.

use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection},
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use backdrop_core::{AppError, ErrorMetadata, LogLevel};
use backdrop_processing::{ProcessingError, ValidationError};
use backdrop_services::PipelineError;
use serde::{de::DeserializeOwned, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// User-facing message
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether retrying the same request may succeed
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

impl ErrorResponse {
    fn from_app_error(app_error: &AppError, with_details: bool) -> Self {
        Self {
            error: app_error.client_message(),
            details: with_details.then(|| app_error.detailed_message()),
            error_type: with_details.then(|| app_error.error_type().to_string()),
            code: app_error.error_code().to_string(),
            recoverable: app_error.is_recoverable(),
            suggested_action: app_error.suggested_action().map(String::from),
        }
    }
}

/// Wrapper type for AppError to implement IntoResponse
/// (orphan rule: AppError lives in backdrop-core)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

impl From<ValidationError> for HttpAppError {
    fn from(err: ValidationError) -> Self {
        HttpAppError(err.into())
    }
}

impl From<ProcessingError> for HttpAppError {
    fn from(err: ProcessingError) -> Self {
        HttpAppError(err.into())
    }
}

impl From<PipelineError> for HttpAppError {
    fn from(err: PipelineError) -> Self {
        if let Some(stage) = err.stage() {
            tracing::debug!(stage = %stage, "Pipeline stopped");
        }
        HttpAppError(err.into())
    }
}

/// Convert JSON body deserialization failures into a 400 with our ErrorResponse format.
impl From<JsonRejection> for HttpAppError {
    fn from(rejection: JsonRejection) -> Self {
        HttpAppError(AppError::InvalidInput(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

impl From<MultipartRejection> for HttpAppError {
    fn from(rejection: MultipartRejection) -> Self {
        HttpAppError(AppError::InvalidInput(format!(
            "Invalid multipart body: {}",
            rejection.body_text()
        )))
    }
}

/// JSON body extractor that returns our ErrorResponse format (400 + JSON) on deserialization failure.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state)
            .await
            .map_err(HttpAppError::from)?;
        Ok(ValidatedJson(inner))
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    let code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type, code, "Request failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type, code, "Request failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %error.detailed_message(), error_type, code, "Request failed");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        // Details never leave the server in production or for sensitive errors
        let with_details = !is_production_env() && !app_error.is_sensitive();
        let body = ErrorResponse::from_app_error(app_error, with_details);

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backdrop_services::PipelineStage;
    use std::time::Duration;

    #[test]
    fn test_from_validation_error_too_large() {
        let err = ValidationError::FileTooLarge {
            size: 300 * 1024 * 1024,
            max: 200 * 1024 * 1024,
        };
        let HttpAppError(app_err) = err.into();
        assert_eq!(app_err.http_status_code(), 413);
        assert_eq!(app_err.client_message(), "File size must be less than 200MB");
    }

    #[test]
    fn test_from_validation_error_content_type() {
        let err = ValidationError::InvalidContentType {
            content_type: "text/plain".to_string(),
        };
        let HttpAppError(app_err) = err.into();
        assert_eq!(app_err.http_status_code(), 415);
        assert_eq!(app_err.client_message(), "Please upload an image file");
    }

    #[test]
    fn test_from_pipeline_error_keeps_stage_source() {
        let err = PipelineError::Stage {
            stage: PipelineStage::Generation,
            source: AppError::GenerationFailed { status: 503 },
        };
        let HttpAppError(app_err) = err.into();
        match app_err {
            AppError::GenerationFailed { status } => assert_eq!(status, 503),
            other => panic!("Expected GenerationFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_from_pipeline_timeout() {
        let HttpAppError(app_err) = PipelineError::TimedOut(Duration::from_secs(60)).into();
        assert_eq!(app_err.http_status_code(), 504);
        assert_eq!(
            app_err.client_message(),
            "Request timed out. Please try again with a faster connection."
        );
    }

    #[test]
    fn test_sensitive_errors_hide_details() {
        let app_err = AppError::MalformedResponse("garbage".to_string());
        let body = ErrorResponse::from_app_error(&app_err, false);
        assert!(body.details.is_none());
        assert!(body.error_type.is_none());
        assert_eq!(body.code, "MALFORMED_RESPONSE");
    }

    #[test]
    fn test_error_response_serializes_user_message() {
        let app_err = AppError::UpstreamRejected {
            status: 402,
            message: "Insufficient credits".to_string(),
        };
        let body = ErrorResponse::from_app_error(&app_err, true);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"], "Insufficient credits");
        assert_eq!(json["code"], "UPSTREAM_REJECTED");
        assert_eq!(json["error_type"], "UpstreamRejected");
    }

    #[test]
    fn test_into_response_relays_upstream_status() {
        let response = HttpAppError(AppError::UpstreamRejected {
            status: 403,
            message: "Forbidden".to_string(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
