//! `data:` URL codec used by the JSON change-background surface.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::AppError;

/// A decoded `data:<mime>;base64,<payload>` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    /// Declared media type, if the input carried a header.
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl DataUrl {
    /// Parse a data URL, or a bare base64 payload with no header.
    ///
    /// Only the part after the first comma is decoded, so clients may send
    /// either form.
    pub fn parse(input: &str) -> Result<Self, AppError> {
        let input = input.trim();
        let (mime_type, payload) = match input.split_once(',') {
            Some((header, payload)) => (parse_header(header), payload),
            None => (None, input),
        };

        if payload.is_empty() {
            return Err(AppError::Decode("Image data is empty".to_string()));
        }

        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| AppError::Decode(format!("Invalid base64 image data: {}", e)))?;

        Ok(Self { mime_type, bytes })
    }

    /// Encode bytes as `data:<mime>;base64,<payload>`.
    pub fn format(mime_type: &str, bytes: &[u8]) -> String {
        format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
    }
}

fn parse_header(header: &str) -> Option<String> {
    let media = header.strip_prefix("data:")?;
    let mime = media.split(';').next().unwrap_or_default().trim();
    if mime.is_empty() {
        None
    } else {
        Some(mime.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_data_url() {
        let parsed = DataUrl::parse("data:image/jpeg;base64,aGVsbG8=").unwrap();
        assert_eq!(parsed.mime_type.as_deref(), Some("image/jpeg"));
        assert_eq!(parsed.bytes, b"hello");
    }

    #[test]
    fn test_parse_bare_payload() {
        let parsed = DataUrl::parse("aGVsbG8=").unwrap();
        assert!(parsed.mime_type.is_none());
        assert_eq!(parsed.bytes, b"hello");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = DataUrl::parse("data:image/png;base64,@@@").unwrap_err();
        assert!(matches!(err, AppError::Decode(_)));

        let err = DataUrl::parse("data:image/png;base64,").unwrap_err();
        assert!(matches!(err, AppError::Decode(_)));
    }

    #[test]
    fn test_format_produces_parseable_url() {
        let url = DataUrl::format("image/png", &[1, 2, 3]);
        assert_eq!(url, "data:image/png;base64,AQID");
        assert_eq!(DataUrl::parse(&url).unwrap().bytes, vec![1, 2, 3]);
    }
}
