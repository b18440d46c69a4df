//! Image processing module
//!
//! - Resizing helpers (resize)
//! - Upload normalization (normalize)
//! - Radial gradients used for feathering and vignettes (gradient)
//! - Cutout over background compositing (composite)

pub mod composite;
pub mod gradient;
pub mod normalize;
pub mod resize;

pub use composite::{CompositeOptions, Compositor, CropRect, Placement};
pub use gradient::RadialGradient;
pub use normalize::{ImageNormalizer, NormalizeOptions};
pub use resize::ImageResize;
