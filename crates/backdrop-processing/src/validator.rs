use backdrop_core::AppError;

/// Validation errors for uploaded images
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Invalid content type: {content_type}")]
    InvalidContentType { content_type: String },

    #[error("Empty file")]
    EmptyFile,
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::FileTooLarge { size, max } => AppError::SizeLimit { size, max },
            ValidationError::InvalidContentType { content_type } => {
                AppError::UnsupportedType(content_type)
            }
            ValidationError::EmptyFile => AppError::InvalidInput("Uploaded file is empty".to_string()),
        }
    }
}

/// Upload validator
///
/// Enforces the byte cap and the `image/*` media type before any decoding
/// work is attempted.
#[derive(Debug, Clone, Copy)]
pub struct UploadValidator {
    max_file_size: usize,
}

impl UploadValidator {
    pub fn new(max_file_size: usize) -> Self {
        Self { max_file_size }
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Validate that the declared media type is an image type
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        let normalized = content_type.trim().to_ascii_lowercase();

        if !normalized.starts_with("image/") {
            return Err(ValidationError::InvalidContentType {
                content_type: content_type.to_string(),
            });
        }

        Ok(())
    }

    /// Validate size, then media type when one was declared
    pub fn validate(&self, size: usize, content_type: Option<&str>) -> Result<(), ValidationError> {
        self.validate_file_size(size)?;
        if let Some(content_type) = content_type {
            self.validate_content_type(content_type)?;
        }
        Ok(())
    }
}
