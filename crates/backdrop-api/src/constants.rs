//! API constants
//!
//! Route paths and the user-facing messages the handlers emit directly.

pub const REMOVE_BG_PATH: &str = "/api/remove-bg";
pub const CHANGE_BG_PATH: &str = "/api/change-bg";
pub const OPENAPI_PATH: &str = "/api/openapi.json";

/// Multipart field carrying the upload on `/api/remove-bg`
pub const IMAGE_FIELD: &str = "image";
/// Multipart field carrying the removal quality hint
pub const QUALITY_FIELD: &str = "quality";

pub const NO_IMAGE_MESSAGE: &str = "No image file provided";
pub const MISSING_FIELDS_MESSAGE: &str = "Image and prompt are required";

/// Room for multipart framing and the base64 expansion of JSON bodies
pub const BODY_LIMIT_OVERHEAD_BYTES: usize = 1024 * 1024;
