use std::sync::Arc;

use axum::{
    body::Body,
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, StatusCode},
    response::Response,
};
use backdrop_core::constants::REMOVED_BACKGROUND_FILENAME;
use backdrop_core::AppError;
use backdrop_services::RemovalOptions;
use bytes::Bytes;

use crate::constants::{IMAGE_FIELD, NO_IMAGE_MESSAGE, QUALITY_FIELD};
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

/// Uploaded image part
struct ImageUpload {
    data: Bytes,
    content_type: Option<String>,
}

/// Fields of the removal form; both are optional on the wire
#[derive(Default)]
struct RemovalForm {
    image: Option<ImageUpload>,
    quality: Option<String>,
}

async fn extract_removal_form(mut multipart: Multipart) -> Result<RemovalForm, AppError> {
    let mut form = RemovalForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(IMAGE_FIELD) => {
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read file data: {}", e))
                })?;
                form.image = Some(ImageUpload { data, content_type });
            }
            Some(QUALITY_FIELD) => {
                let quality = field.text().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read quality: {}", e))
                })?;
                form.quality = Some(quality);
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Remove the background from an uploaded image
///
/// Responds with the PNG cutout as an attachment. Upstream rejections are
/// relayed with their status and message.
#[utoipa::path(
    post,
    path = "/api/remove-bg",
    tag = "background",
    request_body(content = inline(Object), content_type = "multipart/form-data",
        description = "Fields: `image` (binary), `quality` (optional, default \"full\")"),
    responses(
        (status = 200, description = "PNG cutout", content_type = "image/png"),
        (status = 400, description = "No image provided", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 415, description = "Not an image", body = ErrorResponse),
        (status = 500, description = "Removal service not configured or failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "remove_background"))]
pub async fn remove_background(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, HttpAppError> {
    let form = extract_removal_form(multipart?).await?;

    let image = form
        .image
        .ok_or_else(|| AppError::InvalidInput(NO_IMAGE_MESSAGE.to_string()))?;
    state
        .validator
        .validate(image.data.len(), image.content_type.as_deref())?;

    let options = RemovalOptions::standalone(form.quality.unwrap_or_default());
    let content_type = image
        .content_type
        .as_deref()
        .unwrap_or("application/octet-stream");
    let input_size = image.data.len();

    let cutout = state
        .remover
        .remove_background(image.data, content_type, &options)
        .await?;

    tracing::info!(
        input_size,
        width = cutout.width(),
        height = cutout.height(),
        "Background removed"
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/png")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={}", REMOVED_BACKGROUND_FILENAME),
        )
        .body(Body::from(cutout.into_encoded()))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build response");
            AppError::Internal(e.to_string()).into()
        })
}
