use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, Rgb, RgbImage};

use crate::error::ProcessingError;

/// Output format for encoded images
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            _ => Err(format!("Invalid format: {}", s)),
        }
    }

    pub fn to_mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
        }
    }
}

/// Format plus quality for a single encode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageEncoding {
    pub format: OutputFormat,
    /// JPEG quality (1-100); ignored for PNG
    pub quality: u8,
}

impl ImageEncoding {
    pub fn jpeg(quality: u8) -> Self {
        Self {
            format: OutputFormat::Jpeg,
            quality: quality.clamp(1, 100),
        }
    }

    pub fn png() -> Self {
        Self {
            format: OutputFormat::Png,
            quality: 100,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// Whether the encoded form keeps an alpha channel
    pub fn keeps_alpha(&self) -> bool {
        self.format == OutputFormat::Png
    }
}

/// Encoder front-end over the `image` codecs
pub struct ImageCompressor;

impl ImageCompressor {
    /// Encode an image with the requested format and quality
    pub fn compress(img: &DynamicImage, encoding: ImageEncoding) -> Result<Bytes, ProcessingError> {
        let data = match encoding.format {
            OutputFormat::Jpeg => Self::compress_jpeg(img, encoding.quality)?,
            OutputFormat::Png => Self::compress_png(img)?,
        };

        tracing::debug!(
            format = ?encoding.format,
            quality = encoding.quality,
            size = data.len(),
            "Encoded image"
        );

        Ok(data)
    }

    /// Compress to baseline JPEG; transparency is flattened onto black
    fn compress_jpeg(img: &DynamicImage, quality: u8) -> Result<Bytes, ProcessingError> {
        let rgb = DynamicImage::ImageRgb8(flatten_onto_black(img));
        let mut buffer = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        rgb.write_with_encoder(encoder)
            .map_err(ProcessingError::Encode)?;

        Ok(Bytes::from(buffer))
    }

    /// Compress to PNG at the strongest lossless setting
    fn compress_png(img: &DynamicImage) -> Result<Bytes, ProcessingError> {
        let mut buffer = Vec::new();
        let encoder =
            PngEncoder::new_with_quality(&mut buffer, CompressionType::Best, FilterType::Adaptive);
        img.write_with_encoder(encoder)
            .map_err(ProcessingError::Encode)?;

        Ok(Bytes::from(buffer))
    }
}

/// Drop the alpha channel the way a canvas JPEG export does: every pixel is
/// composited over opaque black.
pub fn flatten_onto_black(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let scale = |c: u8| ((c as u32 * a as u32 + 127) / 255) as u8;
        Rgb([scale(r), scale(g), scale(b)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("jpeg").unwrap(), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::parse("JPG").unwrap(), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::parse("png").unwrap(), OutputFormat::Png);
        assert!(OutputFormat::parse("avif").is_err());
    }

    #[test]
    fn test_output_format_to_mime_type() {
        assert_eq!(OutputFormat::Jpeg.to_mime_type(), "image/jpeg");
        assert_eq!(OutputFormat::Png.to_mime_type(), "image/png");
        assert_eq!(ImageEncoding::jpeg(80).mime_type(), "image/jpeg");
    }

    #[test]
    fn test_jpeg_quality_is_clamped() {
        assert_eq!(ImageEncoding::jpeg(0).quality, 1);
        assert_eq!(ImageEncoding::jpeg(150).quality, 100);
    }

    #[test]
    fn test_image_compressor_compress() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(64, 48, Rgba([255, 0, 0, 128])));

        let jpeg = ImageCompressor::compress(&img, ImageEncoding::jpeg(80)).unwrap();
        assert_eq!(image::guess_format(&jpeg).unwrap(), ImageFormat::Jpeg);

        let png = ImageCompressor::compress(&img, ImageEncoding::png()).unwrap();
        assert_eq!(image::guess_format(&png).unwrap(), ImageFormat::Png);

        let decoded = image::load_from_memory(&png).unwrap();
        assert!(decoded.color().has_alpha());
        assert_eq!(decoded.to_rgba8().get_pixel(0, 0), &Rgba([255, 0, 0, 128]));
    }

    #[test]
    fn test_flatten_onto_black() {
        let mut img = RgbaImage::from_pixel(2, 1, Rgba([255, 255, 255, 0]));
        img.put_pixel(1, 0, Rgba([200, 100, 50, 128]));

        let flat = flatten_onto_black(&DynamicImage::ImageRgba8(img));
        assert_eq!(flat.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(flat.get_pixel(1, 0), &Rgb([100, 50, 25]));
    }

    #[test]
    fn test_jpeg_of_transparent_pixels_is_black() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(32, 32, Rgba([255, 255, 255, 0])));
        let jpeg = ImageCompressor::compress(&img, ImageEncoding::jpeg(90)).unwrap();

        let decoded = image::load_from_memory(&jpeg).unwrap().to_rgb8();
        let Rgb([r, g, b]) = *decoded.get_pixel(16, 16);
        assert!(r <= 4 && g <= 4 && b <= 4, "got {:?}", (r, g, b));
    }

    #[test]
    fn test_lower_quality_produces_smaller_jpeg() {
        let mut img = RgbaImage::new(128, 128);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = Rgba([(x * 2) as u8, (y * 2) as u8, ((x ^ y) * 2) as u8, 255]);
        }
        let img = DynamicImage::ImageRgba8(img);

        let high = ImageCompressor::compress(&img, ImageEncoding::jpeg(95)).unwrap();
        let low = ImageCompressor::compress(&img, ImageEncoding::jpeg(30)).unwrap();
        assert!(low.len() < high.len());
    }
}
