use std::io::Cursor;

use backdrop_core::DataUrl;
use bytes::Bytes;
use image::metadata::Orientation;
use image::{DynamicImage, GenericImageView, ImageDecoder, ImageReader};

use crate::compression::{flatten_onto_black, ImageCompressor, ImageEncoding};
use crate::error::ProcessingError;

/// A decoded bitmap together with its encoded form.
///
/// Assets move through the pipeline by value; each stage consumes one and
/// produces a new one.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    image: DynamicImage,
    encoded: Bytes,
    content_type: String,
}

impl ImageAsset {
    /// Decode an encoded image, sniffing the format from its magic bytes.
    ///
    /// The EXIF orientation is applied, so the bitmap is upright the way a
    /// browser draws it.
    pub fn decode(data: impl Into<Bytes>) -> Result<Self, ProcessingError> {
        let encoded = data.into();
        let reader = ImageReader::new(Cursor::new(encoded.as_ref()))
            .with_guessed_format()
            .map_err(|e| ProcessingError::Decode(image::ImageError::IoError(e)))?;

        let content_type = reader
            .format()
            .map(|f| f.to_mime_type().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let mut decoder = reader.into_decoder().map_err(ProcessingError::Decode)?;
        let orientation = decoder.orientation().map_err(ProcessingError::Decode)?;
        let mut image = DynamicImage::from_decoder(decoder).map_err(ProcessingError::Decode)?;
        if orientation != Orientation::NoTransforms {
            tracing::debug!(orientation = ?orientation, "Applying EXIF orientation");
            image.apply_orientation(orientation);
        }

        if image.width() == 0 || image.height() == 0 {
            return Err(ProcessingError::EmptyImage);
        }

        Ok(Self {
            image,
            encoded,
            content_type,
        })
    }

    /// Encode a bitmap and keep both forms.
    ///
    /// The stored bitmap matches what the encoding can represent, so a JPEG
    /// asset never reports an alpha channel.
    pub fn encode(image: DynamicImage, encoding: ImageEncoding) -> Result<Self, ProcessingError> {
        let image = if encoding.keeps_alpha() || !image.color().has_alpha() {
            image
        } else {
            DynamicImage::ImageRgb8(flatten_onto_black(&image))
        };
        let encoded = ImageCompressor::compress(&image, encoding)?;

        Ok(Self {
            image,
            encoded,
            content_type: encoding.mime_type().to_string(),
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Whether the bitmap carries an alpha channel
    pub fn has_alpha(&self) -> bool {
        self.image.color().has_alpha()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn encoded(&self) -> &Bytes {
        &self.encoded
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn into_image(self) -> DynamicImage {
        self.image
    }

    pub fn into_encoded(self) -> Bytes {
        self.encoded
    }

    pub fn to_data_url(&self) -> String {
        DataUrl::format(&self.content_type, &self.encoded)
    }
}
