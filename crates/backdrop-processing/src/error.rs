use backdrop_core::AppError;

use crate::validator::ValidationError;

/// Errors raised by local image processing
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Image has zero width or height")]
    EmptyImage,

    #[error("Invalid canvas size: {0}")]
    InvalidCanvas(u32),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl From<ProcessingError> for AppError {
    fn from(err: ProcessingError) -> Self {
        match err {
            ProcessingError::Decode(e) => AppError::Decode(e.to_string()),
            ProcessingError::EmptyImage => AppError::Decode("Image has no pixels".to_string()),
            ProcessingError::Encode(e) => AppError::Compositing(e.to_string()),
            ProcessingError::InvalidCanvas(size) => {
                AppError::InvalidInput(format!("Canvas size must be positive, got {}", size))
            }
            ProcessingError::Validation(e) => e.into(),
        }
    }
}
