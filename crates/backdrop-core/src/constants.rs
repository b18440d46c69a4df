//! Shared defaults for the pipeline and the proxy.

/// Upper bound on accepted upload size (200 MiB).
pub const MAX_UPLOAD_SIZE_MB: usize = 200;

/// Longest side of a normalized upload.
pub const DEFAULT_MAX_DIMENSION: u32 = 1024;

/// Longest side of an upload prepared for standalone removal.
pub const REMOVAL_MAX_DIMENSION: u32 = 2048;

/// JPEG quality used when normalizing for the change-background path.
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Reference canvas side; vignette radii are expressed relative to it.
pub const REFERENCE_CANVAS_SIZE: u32 = 768;

/// Canvas side used for narrow viewports.
pub const COMPACT_CANVAS_SIZE: u32 = 512;

/// Size requested from the background generator.
pub const DEFAULT_BACKGROUND_SIZE: u32 = 512;

/// Budget for one end-to-end pipeline run.
pub const DEFAULT_PIPELINE_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_REMOVAL_TIMEOUT_SECS: u64 = 30;
pub const MIN_REMOVAL_TIMEOUT_SECS: u64 = 30;
pub const MAX_REMOVAL_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_REMOVE_BG_API_URL: &str = "https://api.remove.bg/v1.0/removebg";
pub const DEFAULT_IMAGE_GENERATION_API_URL: &str = "https://image.pollinations.ai";

/// File name offered for a standalone cutout download.
pub const REMOVED_BACKGROUND_FILENAME: &str = "background-removed.png";

/// File name offered for a composite download.
pub const CHANGED_BACKGROUND_FILENAME: &str = "background-changed.png";

/// Quality hint sent upstream when the caller gives none.
pub const DEFAULT_REMOVAL_QUALITY: &str = "full";
