use backdrop_core::constants::{
    DEFAULT_JPEG_QUALITY, DEFAULT_MAX_DIMENSION, MAX_UPLOAD_SIZE_MB, REMOVAL_MAX_DIMENSION,
};
use bytes::Bytes;

use super::resize::ImageResize;
use crate::asset::ImageAsset;
use crate::compression::ImageEncoding;
use crate::error::ProcessingError;
use crate::validator::UploadValidator;

/// Target shape of a normalized upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub max_dimension: u32,
    pub encoding: ImageEncoding,
}

impl NormalizeOptions {
    pub fn new(max_dimension: u32, encoding: ImageEncoding) -> Self {
        Self {
            max_dimension,
            encoding,
        }
    }

    /// Lossy JPEG for the change-background path, bounding payload size
    pub fn for_composite() -> Self {
        Self::new(
            DEFAULT_MAX_DIMENSION,
            ImageEncoding::jpeg(DEFAULT_JPEG_QUALITY),
        )
    }

    /// Lossless PNG for the standalone removal path, preserving edges
    pub fn for_removal() -> Self {
        Self::new(REMOVAL_MAX_DIMENSION, ImageEncoding::png())
    }
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self::for_composite()
    }
}

/// Decodes, downsamples and re-encodes uploads
#[derive(Debug, Clone, Copy)]
pub struct ImageNormalizer {
    validator: UploadValidator,
}

impl Default for ImageNormalizer {
    fn default() -> Self {
        Self::new(MAX_UPLOAD_SIZE_MB * 1024 * 1024)
    }
}

impl ImageNormalizer {
    pub fn new(max_input_bytes: usize) -> Self {
        Self {
            validator: UploadValidator::new(max_input_bytes),
        }
    }

    /// Normalize raw upload bytes.
    ///
    /// `content_type` is the declared media type, when the transport carried
    /// one. The size cap and media type are checked before decoding.
    pub fn normalize(
        &self,
        raw: impl Into<Bytes>,
        content_type: Option<&str>,
        options: NormalizeOptions,
    ) -> Result<ImageAsset, ProcessingError> {
        let raw = raw.into();
        self.validator.validate(raw.len(), content_type)?;

        let decoded = ImageAsset::decode(raw)?;
        let (width, height) = decoded.dimensions();
        let (target_width, target_height) =
            ImageResize::fit_within(width, height, options.max_dimension);

        tracing::debug!(
            width,
            height,
            target_width,
            target_height,
            format = ?options.encoding.format,
            "Normalizing image"
        );

        let image = ImageResize::resize_image(decoded.into_image(), target_width, target_height);
        ImageAsset::encode(image, options.encoding)
    }
}
