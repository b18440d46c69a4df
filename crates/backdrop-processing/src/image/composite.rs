//! Cutout over generated background compositing.
//!
//! The canvas is always square. The background is center-cropped to 1:1 and
//! scaled to fill it, the subject is fitted to 80% of the canvas width (or
//! 95% of its height when that would overflow) and dropped 20px below
//! center, then a faint vignette darkens the corners. The routine is pure:
//! identical inputs produce byte-identical PNG output.

use backdrop_core::constants::{COMPACT_CANVAS_SIZE, REFERENCE_CANVAS_SIZE};
use image::{imageops, DynamicImage, GenericImageView, RgbaImage};

use super::gradient::RadialGradient;
use super::resize::ImageResize;
use crate::asset::ImageAsset;
use crate::compression::ImageEncoding;
use crate::error::ProcessingError;

const SUBJECT_WIDTH_RATIO: f64 = 0.8;
const SUBJECT_MAX_HEIGHT_RATIO: f64 = 0.95;
/// Not scaled with the canvas.
const SUBJECT_DROP_PX: f64 = 20.0;

const FEATHER_RADIUS_RATIO: f32 = 0.6;

const VIGNETTE_INNER_RADIUS: f32 = 200.0;
const VIGNETTE_OUTER_RADIUS: f32 = 600.0;
const VIGNETTE_MAX_OPACITY: f32 = 0.08;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeOptions {
    /// Side of the square output canvas in pixels
    pub canvas_size: u32,
    /// Multiply the subject's alpha by the radial edge gradient
    pub feather: bool,
}

impl CompositeOptions {
    pub fn new(canvas_size: u32) -> Self {
        Self {
            canvas_size,
            feather: false,
        }
    }

    /// Preset for narrow viewports
    pub fn compact() -> Self {
        Self::new(COMPACT_CANVAS_SIZE)
    }

    pub fn with_feather(mut self, feather: bool) -> Self {
        self.feather = feather;
        self
    }
}

impl Default for CompositeOptions {
    fn default() -> Self {
        Self::new(REFERENCE_CANVAS_SIZE)
    }
}

/// Source rectangle taken from the background
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Where the subject lands on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

pub struct Compositor;

impl Compositor {
    /// Centered square crop of a `width` x `height` image
    pub fn crop_rect(width: u32, height: u32) -> CropRect {
        if width > height {
            CropRect {
                x: (width - height) / 2,
                y: 0,
                width: height,
                height,
            }
        } else {
            CropRect {
                x: 0,
                y: (height - width) / 2,
                width,
                height: width,
            }
        }
    }

    /// Size and position of the subject on a `canvas_size` canvas
    pub fn subject_placement(subject_width: u32, subject_height: u32, canvas_size: u32) -> Placement {
        let size = canvas_size as f64;
        let aspect = subject_width.max(1) as f64 / subject_height.max(1) as f64;

        let mut width = size * SUBJECT_WIDTH_RATIO;
        let mut height = width / aspect;
        if height > size * SUBJECT_MAX_HEIGHT_RATIO {
            height = size * SUBJECT_MAX_HEIGHT_RATIO;
            width = height * aspect;
        }

        let x = (size - width) / 2.0;
        let y = (size - height) / 2.0 + SUBJECT_DROP_PX;

        Placement {
            x: x.round() as i64,
            y: y.round() as i64,
            width: (width.round() as u32).max(1),
            height: (height.round() as u32).max(1),
        }
    }

    /// Edge gradient centered on the subject's box
    pub fn feather_gradient(placement: &Placement) -> RadialGradient {
        let cx = placement.x as f32 + placement.width as f32 / 2.0;
        let cy = placement.y as f32 + placement.height as f32 / 2.0;
        let radius = placement.width.max(placement.height) as f32 * FEATHER_RADIUS_RATIO;

        RadialGradient::new((cx, cy), 0.0, radius)
            .with_stop(0.0, 1.0)
            .with_stop(0.85, 0.95)
            .with_stop(1.0, 0.7)
    }

    /// Corner darkening; radii are relative to the 768px reference canvas
    pub fn vignette_gradient(canvas_size: u32) -> RadialGradient {
        let scale = canvas_size as f32 / REFERENCE_CANVAS_SIZE as f32;
        let center = canvas_size as f32 / 2.0;

        RadialGradient::new(
            (center, center),
            VIGNETTE_INNER_RADIUS * scale,
            VIGNETTE_OUTER_RADIUS * scale,
        )
        .with_stop(0.0, 0.0)
        .with_stop(1.0, VIGNETTE_MAX_OPACITY)
    }

    /// Composite `cutout` over `background` and encode the result as PNG.
    ///
    /// A cutout without alpha is drawn as an opaque rectangle.
    pub fn composite(
        cutout: ImageAsset,
        background: ImageAsset,
        options: CompositeOptions,
    ) -> Result<ImageAsset, ProcessingError> {
        let size = options.canvas_size;
        if size == 0 {
            return Err(ProcessingError::InvalidCanvas(size));
        }

        let mut canvas = Self::fit_background(background.into_image(), size);

        let (subject_width, subject_height) = cutout.dimensions();
        let placement = Self::subject_placement(subject_width, subject_height, size);

        tracing::debug!(
            canvas_size = size,
            subject_width = placement.width,
            subject_height = placement.height,
            x = placement.x,
            y = placement.y,
            cutout_has_alpha = cutout.has_alpha(),
            feather = options.feather,
            "Compositing subject over background"
        );

        let mut subject =
            ImageResize::resize_image(cutout.into_image(), placement.width, placement.height)
                .to_rgba8();
        if options.feather {
            Self::feather_gradient(&placement).mask_alpha(&mut subject, (placement.x, placement.y));
        }
        imageops::overlay(&mut canvas, &subject, placement.x, placement.y);

        Self::vignette_gradient(size).darken(&mut canvas);

        ImageAsset::encode(DynamicImage::ImageRgba8(canvas), ImageEncoding::png())
    }

    fn fit_background(background: DynamicImage, canvas_size: u32) -> RgbaImage {
        let (width, height) = background.dimensions();
        let crop = Self::crop_rect(width, height);
        let cropped = background.crop_imm(crop.x, crop.y, crop.width, crop.height);
        ImageResize::resize_image(cropped, canvas_size, canvas_size).to_rgba8()
    }
}
