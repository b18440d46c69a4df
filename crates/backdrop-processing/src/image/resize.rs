use image::{DynamicImage, GenericImageView};

/// Image resize operations
pub struct ImageResize;

impl ImageResize {
    /// Dimensions that fit within `max_dimension` on the longer side.
    ///
    /// Never upscales. The shorter side is rounded half away from zero and
    /// kept at least 1px.
    pub fn fit_within(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
        if width.max(height) <= max_dimension || max_dimension == 0 {
            return (width, height);
        }

        if width >= height {
            let h = (height as f64 * max_dimension as f64 / width as f64).round() as u32;
            (max_dimension, h.max(1))
        } else {
            let w = (width as f64 * max_dimension as f64 / height as f64).round() as u32;
            (w.max(1), max_dimension)
        }
    }

    /// Select appropriate filter type based on resize ratio
    pub fn select_filter(
        orig_width: u32,
        orig_height: u32,
        new_width: u32,
        new_height: u32,
    ) -> image::imageops::FilterType {
        let width_ratio = orig_width as f32 / new_width.max(1) as f32;
        let height_ratio = orig_height as f32 / new_height.max(1) as f32;
        let max_ratio = width_ratio.max(height_ratio);

        if max_ratio > 2.0 {
            image::imageops::FilterType::Triangle
        } else if max_ratio > 1.5 {
            image::imageops::FilterType::CatmullRom
        } else {
            image::imageops::FilterType::Lanczos3
        }
    }

    /// Resize image to exact dimensions; returns the input untouched when
    /// the size already matches
    pub fn resize_image(img: DynamicImage, width: u32, height: u32) -> DynamicImage {
        let (orig_width, orig_height) = img.dimensions();
        if (orig_width, orig_height) == (width, height) {
            return img;
        }
        let filter = Self::select_filter(orig_width, orig_height, width, height);
        img.resize_exact(width, height, filter)
    }
}
