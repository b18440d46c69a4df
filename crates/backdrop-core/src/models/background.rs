use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of `POST /api/change-bg`.
///
/// Both fields are optional at the wire level so a missing field is reported
/// as a validation error rather than a JSON rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ChangeBackgroundRequest {
    /// Source image as a `data:` URL or bare base64 payload
    #[serde(default)]
    pub image: Option<String>,
    /// Text prompt for the generated background
    #[serde(default)]
    pub prompt: Option<String>,
}

impl ChangeBackgroundRequest {
    /// Returns `(image, prompt)` when both are present and non-blank.
    pub fn required_fields(&self) -> Option<(&str, &str)> {
        let image = self.image.as_deref().filter(|s| !s.trim().is_empty())?;
        let prompt = self.prompt.as_deref().filter(|s| !s.trim().is_empty())?;
        Some((image, prompt))
    }
}

/// Successful response of `POST /api/change-bg`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeBackgroundResponse {
    pub success: bool,
    /// Cutout as a PNG data URL, or the original image when removal degraded
    pub person_with_transparency: String,
    /// Generated background as a data URL
    pub background: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_fields() {
        let req: ChangeBackgroundRequest =
            serde_json::from_str(r#"{"image":"aGVsbG8=","prompt":"a beach"}"#).unwrap();
        assert_eq!(req.required_fields(), Some(("aGVsbG8=", "a beach")));

        let req: ChangeBackgroundRequest = serde_json::from_str(r#"{"image":"aGVsbG8="}"#).unwrap();
        assert!(req.required_fields().is_none());

        let req: ChangeBackgroundRequest =
            serde_json::from_str(r#"{"image":"aGVsbG8=","prompt":"   "}"#).unwrap();
        assert!(req.required_fields().is_none());
    }

    #[test]
    fn test_response_uses_camel_case() {
        let resp = ChangeBackgroundResponse {
            success: true,
            person_with_transparency: "data:image/png;base64,AA==".to_string(),
            background: "data:image/jpeg;base64,AA==".to_string(),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["personWithTransparency"], "data:image/png;base64,AA==");
        assert!(json.get("person_with_transparency").is_none());
    }
}
