//! Backdrop image processing
//!
//! Local, synchronous image work: upload validation, normalization,
//! encoding and the background compositor. Nothing here performs I/O beyond
//! in-memory encode/decode, so callers on an async runtime should run these
//! routines on a blocking thread.

pub mod asset;
pub mod compression;
pub mod error;
pub mod image;
pub mod validator;

#[cfg(test)]
mod test_support;

pub use crate::asset::ImageAsset;
pub use crate::compression::{ImageCompressor, ImageEncoding, OutputFormat};
pub use crate::error::ProcessingError;
pub use crate::image::{
    CompositeOptions, Compositor, ImageNormalizer, ImageResize, NormalizeOptions, RadialGradient,
};
pub use crate::validator::{UploadValidator, ValidationError};
