use std::sync::Arc;

use axum::{extract::State, Json};
use backdrop_core::models::{ChangeBackgroundRequest, ChangeBackgroundResponse};
use backdrop_core::{AppError, DataUrl};
use backdrop_processing::ImageAsset;
use backdrop_services::RemovalOutcome;

use crate::constants::MISSING_FIELDS_MESSAGE;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

/// Cut out the subject and generate a new background for it
///
/// Returns both layers as data URLs; compositing is left to the caller.
/// When removal is rejected upstream, `personWithTransparency` is the
/// request's `image` unchanged.
#[utoipa::path(
    post,
    path = "/api/change-bg",
    tag = "background",
    request_body = ChangeBackgroundRequest,
    responses(
        (status = 200, description = "Subject and background layers", body = ChangeBackgroundResponse),
        (status = 400, description = "Image or prompt missing, or image undecodable", body = ErrorResponse),
        (status = 413, description = "Image too large", body = ErrorResponse),
        (status = 500, description = "Background generation failed", body = ErrorResponse),
        (status = 504, description = "Upstreams exceeded the time budget", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(operation = "change_background"))]
pub async fn change_background(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<ChangeBackgroundRequest>,
) -> Result<Json<ChangeBackgroundResponse>, HttpAppError> {
    let (image, prompt) = request
        .required_fields()
        .ok_or_else(|| AppError::InvalidInput(MISSING_FIELDS_MESSAGE.to_string()))?;

    let data_url = DataUrl::parse(image)?;
    state
        .validator
        .validate(data_url.bytes.len(), data_url.mime_type.as_deref())?;

    let subject = tokio::task::spawn_blocking(move || ImageAsset::decode(data_url.bytes))
        .await
        .map_err(|e| AppError::Internal(format!("Decode task failed: {}", e)))??;

    let layers = state.pipeline.fetch_layers(subject, prompt).await?;

    let person_with_transparency = match &layers.subject {
        RemovalOutcome::Removed(cutout) => cutout.to_data_url(),
        RemovalOutcome::Degraded { .. } => image.to_string(),
    };

    tracing::info!(
        degraded = layers.subject.is_degraded(),
        background_width = layers.background.width(),
        background_height = layers.background.height(),
        "Background changed"
    );

    Ok(Json(ChangeBackgroundResponse {
        success: true,
        person_with_transparency,
        background: layers.background.to_data_url(),
    }))
}
