//! Background removal client (remove.bg compatible API)
//!
//! Uploads an image as multipart form data and expects the cutout PNG back.
//! Non-success responses carry `{ "errors": [ { "title": ... } ] }`.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use backdrop_core::constants::{DEFAULT_REMOVAL_QUALITY, DEFAULT_REMOVE_BG_API_URL};
use backdrop_core::error::DEFAULT_UPSTREAM_MESSAGE;
use backdrop_core::{AppError, Config};
use backdrop_processing::ImageAsset;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use super::decode_upstream_image;

pub const MISSING_API_KEY_MESSAGE: &str =
    "Remove.bg API key not configured. Please add REMOVE_BG_API_KEY to environment variables.";

/// Form parameters sent alongside the image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalOptions {
    pub size: Option<String>,
    pub subject_type: String,
    pub format: String,
    pub quality: String,
    pub edge: Option<String>,
}

impl RemovalOptions {
    /// The caller asked for a cutout and nothing else
    pub fn standalone(quality: impl Into<String>) -> Self {
        let quality = quality.into();
        Self {
            size: Some("auto".to_string()),
            subject_type: "auto".to_string(),
            format: "png".to_string(),
            quality: if quality.trim().is_empty() {
                DEFAULT_REMOVAL_QUALITY.to_string()
            } else {
                quality
            },
            edge: None,
        }
    }

    /// Person cutout destined for the compositor
    pub fn for_composite() -> Self {
        Self {
            size: None,
            subject_type: "person".to_string(),
            format: "png".to_string(),
            quality: "standard".to_string(),
            edge: Some("natural".to_string()),
        }
    }

    fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::with_capacity(5);
        if let Some(size) = &self.size {
            fields.push(("size", size.clone()));
        }
        fields.push(("type", self.subject_type.clone()));
        fields.push(("format", self.format.clone()));
        fields.push(("quality", self.quality.clone()));
        if let Some(edge) = &self.edge {
            fields.push(("edge", edge.clone()));
        }
        fields
    }
}

impl Default for RemovalOptions {
    fn default() -> Self {
        Self::standalone(DEFAULT_REMOVAL_QUALITY)
    }
}

/// Result of a best-effort removal
#[derive(Debug)]
pub enum RemovalOutcome {
    Removed(ImageAsset),
    /// Upstream rejected the request; the original stands in for the cutout
    Degraded {
        original: ImageAsset,
        reason: AppError,
    },
}

impl RemovalOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, RemovalOutcome::Degraded { .. })
    }

    pub fn asset(&self) -> &ImageAsset {
        match self {
            RemovalOutcome::Removed(asset) => asset,
            RemovalOutcome::Degraded { original, .. } => original,
        }
    }
}

/// Segmentation backend that turns a photo into an alpha-carrying cutout
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    /// Remove the background; every failure is surfaced to the caller
    async fn remove_background(
        &self,
        image: Bytes,
        content_type: &str,
        options: &RemovalOptions,
    ) -> Result<ImageAsset, AppError>;

    /// Remove the background, falling back to `original` when upstream
    /// rejects the request. Network, configuration and decode failures
    /// stay terminal.
    async fn remove_or_degrade(
        &self,
        original: ImageAsset,
        options: &RemovalOptions,
    ) -> Result<RemovalOutcome, AppError> {
        let result = self
            .remove_background(
                original.encoded().clone(),
                original.content_type(),
                options,
            )
            .await;

        match result {
            Ok(cutout) => Ok(RemovalOutcome::Removed(cutout)),
            Err(reason @ AppError::UpstreamRejected { .. }) => {
                tracing::warn!(
                    error = %reason,
                    "Background removal rejected, continuing with original image"
                );
                Ok(RemovalOutcome::Degraded { original, reason })
            }
            Err(e) => Err(e),
        }
    }
}

#[derive(Clone)]
pub struct RemoveBgConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Debug for RemoveBgConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("RemoveBgConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for RemoveBgConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_REMOVE_BG_API_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl From<&Config> for RemoveBgConfig {
    fn from(config: &Config) -> Self {
        Self {
            api_url: config.remove_bg_api_url().to_string(),
            api_key: config.remove_bg_api_key().map(str::to_string),
            timeout: config.remove_bg_timeout(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RemoveBgErrorBody {
    #[serde(default)]
    errors: Vec<RemoveBgErrorItem>,
}

#[derive(Debug, Deserialize)]
struct RemoveBgErrorItem {
    title: Option<String>,
}

fn error_title(body: &str) -> String {
    serde_json::from_str::<RemoveBgErrorBody>(body)
        .ok()
        .and_then(|b| b.errors.into_iter().next())
        .and_then(|e| e.title)
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_UPSTREAM_MESSAGE.to_string())
}

fn file_name_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "image.png",
        "image/webp" => "image.webp",
        "image/gif" => "image.gif",
        _ => "image.jpg",
    }
}

/// HTTP client for the removal service
pub struct RemoveBgService {
    http_client: reqwest::Client,
    config: RemoveBgConfig,
}

impl Debug for RemoveBgService {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("RemoveBgService")
            .field("config", &self.config)
            .finish()
    }
}

impl RemoveBgService {
    pub fn new(config: RemoveBgConfig) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to create HTTP client for background removal")?;

        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }
}

#[async_trait]
impl BackgroundRemover for RemoveBgService {
    #[tracing::instrument(skip(self, image), fields(size = image.len(), quality = %options.quality))]
    async fn remove_background(
        &self,
        image: Bytes,
        content_type: &str,
        options: &RemovalOptions,
    ) -> Result<ImageAsset, AppError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Configuration(MISSING_API_KEY_MESSAGE.to_string()))?;

        let part = Part::bytes(image.to_vec())
            .file_name(file_name_for(content_type))
            .mime_str(content_type)
            .map_err(|e| AppError::InvalidInput(format!("Invalid content type: {}", e)))?;

        let mut form = Form::new().part("image_file", part);
        for (name, value) in options.form_fields() {
            form = form.text(name, value);
        }

        let response = self
            .http_client
            .post(&self.config.api_url)
            .header("X-Api-Key", api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                AppError::UpstreamUnavailable(format!("Background removal request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = error_title(&error_text);
            tracing::debug!(status = status.as_u16(), %message, "Background removal rejected");
            return Err(AppError::UpstreamRejected {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await.map_err(|e| {
            AppError::UpstreamUnavailable(format!("Failed to read background removal response: {}", e))
        })?;

        let cutout = decode_upstream_image(body, "Background removal service").await?;
        tracing::info!(
            width = cutout.width(),
            height = cutout.height(),
            has_alpha = cutout.has_alpha(),
            "Background removed"
        );

        Ok(cutout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backdrop_processing::{ImageCompressor, ImageEncoding};
    use image::{DynamicImage, Rgba, RgbaImage};
    use mockito::Matcher;

    fn png_bytes(alpha: u8) -> Bytes {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, alpha])));
        ImageCompressor::compress(&img, ImageEncoding::png()).unwrap()
    }

    fn service(url: String, key: Option<&str>) -> RemoveBgService {
        RemoveBgService::new(RemoveBgConfig {
            api_url: url,
            api_key: key.map(str::to_string),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_form_fields() {
        let fields = RemovalOptions::standalone("full").form_fields();
        assert_eq!(
            fields,
            vec![
                ("size", "auto".to_string()),
                ("type", "auto".to_string()),
                ("format", "png".to_string()),
                ("quality", "full".to_string()),
            ]
        );

        let fields = RemovalOptions::for_composite().form_fields();
        assert_eq!(
            fields,
            vec![
                ("type", "person".to_string()),
                ("format", "png".to_string()),
                ("quality", "standard".to_string()),
                ("edge", "natural".to_string()),
            ]
        );

        assert_eq!(RemovalOptions::standalone("  ").quality, "full");
    }

    #[test]
    fn test_error_title_parsing() {
        assert_eq!(
            error_title(r#"{"errors":[{"title":"Insufficient credits"}]}"#),
            "Insufficient credits"
        );
        assert_eq!(error_title(r#"{"errors":[]}"#), DEFAULT_UPSTREAM_MESSAGE);
        assert_eq!(error_title("<html>oops</html>"), DEFAULT_UPSTREAM_MESSAGE);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let svc = service("http://localhost".to_string(), Some("super-secret"));
        assert!(!format!("{:?}", svc).contains("super-secret"));
    }

    #[tokio::test]
    async fn test_remove_background_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1.0/removebg")
            .match_header("x-api-key", "test-key")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="image_file"; filename="image.png""#.to_string()),
                Matcher::Regex(r#"name="quality"\r\n\r\nfull"#.to_string()),
                Matcher::Regex(r#"name="size"\r\n\r\nauto"#.to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body(png_bytes(0).to_vec())
            .create_async()
            .await;

        let svc = service(format!("{}/v1.0/removebg", server.url()), Some("test-key"));
        let cutout = svc
            .remove_background(png_bytes(255), "image/png", &RemovalOptions::standalone("full"))
            .await
            .unwrap();

        assert!(cutout.has_alpha());
        assert_eq!(cutout.dimensions(), (8, 8));
        assert_eq!(cutout.content_type(), "image/png");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_remove_background_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/removebg")
            .with_status(403)
            .with_header("content-type", "application/json")
            .with_body(r#"{"errors":[{"title":"Invalid API key"}]}"#)
            .create_async()
            .await;

        let svc = service(format!("{}/removebg", server.url()), Some("bad-key"));
        let err = svc
            .remove_background(png_bytes(255), "image/png", &RemovalOptions::default())
            .await
            .unwrap_err();

        match err {
            AppError::UpstreamRejected { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "Invalid API key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_remove_background_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/removebg")
            .with_status(200)
            .with_body("not a png")
            .create_async()
            .await;

        let svc = service(format!("{}/removebg", server.url()), Some("key"));
        let err = svc
            .remove_background(png_bytes(255), "image/png", &RemovalOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_configuration_error() {
        let svc = service("http://127.0.0.1:9/removebg".to_string(), None);
        assert!(!svc.is_configured());
        let err = svc
            .remove_background(png_bytes(255), "image/png", &RemovalOptions::default())
            .await
            .unwrap_err();
        match err {
            AppError::Configuration(msg) => assert_eq!(msg, MISSING_API_KEY_MESSAGE),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_unavailable() {
        let svc = service("http://127.0.0.1:9/removebg".to_string(), Some("key"));
        let err = svc
            .remove_background(png_bytes(255), "image/png", &RemovalOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_remove_or_degrade_falls_back_on_rejection() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/removebg")
            .match_body(Matcher::Regex(r#"name="type"\r\n\r\nperson"#.to_string()))
            .with_status(402)
            .with_body(r#"{"errors":[{"title":"Insufficient credits"}]}"#)
            .create_async()
            .await;

        let svc = service(format!("{}/removebg", server.url()), Some("key"));
        let original = ImageAsset::decode(png_bytes(255)).unwrap();
        let original_bytes = original.encoded().clone();

        let outcome = svc
            .remove_or_degrade(original, &RemovalOptions::for_composite())
            .await
            .unwrap();

        assert!(outcome.is_degraded());
        assert_eq!(outcome.asset().encoded(), &original_bytes);
        match outcome {
            RemovalOutcome::Degraded { reason, .. } => {
                assert!(matches!(reason, AppError::UpstreamRejected { status: 402, .. }))
            }
            RemovalOutcome::Removed(_) => panic!("expected degradation"),
        }
    }

    #[tokio::test]
    async fn test_remove_or_degrade_keeps_network_errors_terminal() {
        let svc = service("http://127.0.0.1:9/removebg".to_string(), Some("key"));
        let original = ImageAsset::decode(png_bytes(255)).unwrap();
        let err = svc
            .remove_or_degrade(original, &RemovalOptions::for_composite())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UpstreamUnavailable(_)));
    }
}
