//! Prompt-to-image background generation (pollinations compatible API)
//!
//! A single `GET {base}/prompt/{prompt}?width=..&height=..&nologo=true`;
//! the response body is the generated image. No retries.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use backdrop_core::constants::{DEFAULT_GENERATION_TIMEOUT_SECS, DEFAULT_IMAGE_GENERATION_API_URL};
use backdrop_core::{AppError, Config};
use backdrop_processing::ImageAsset;

use super::decode_upstream_image;

/// Generates an opaque background image from a text prompt
#[async_trait]
pub trait BackgroundGenerator: Send + Sync {
    async fn generate_background(
        &self,
        prompt: &str,
        width: u32,
        height: u32,
    ) -> Result<ImageAsset, AppError>;
}

#[derive(Debug, Clone)]
pub struct PollinationsService {
    http_client: reqwest::Client,
    base_url: String,
}

impl PollinationsService {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client for background generation")?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::new(
            config.image_generation_api_url(),
            config.image_generation_timeout(),
        )
    }

    /// Request URL; the prompt is percent-encoded whole, never truncated
    pub fn generation_url(&self, prompt: &str, width: u32, height: u32) -> String {
        format!(
            "{}/prompt/{}?width={}&height={}&nologo=true",
            self.base_url,
            urlencoding::encode(prompt),
            width,
            height
        )
    }
}

impl Default for PollinationsService {
    fn default() -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(DEFAULT_GENERATION_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
            base_url: DEFAULT_IMAGE_GENERATION_API_URL.to_string(),
        }
    }
}

#[async_trait]
impl BackgroundGenerator for PollinationsService {
    #[tracing::instrument(skip(self), fields(prompt_len = prompt.len()))]
    async fn generate_background(
        &self,
        prompt: &str,
        width: u32,
        height: u32,
    ) -> Result<ImageAsset, AppError> {
        let url = self.generation_url(prompt, width, height);

        let response = self.http_client.get(&url).send().await.map_err(|e| {
            AppError::UpstreamUnavailable(format!("Background generation request failed: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Background generation failed");
            return Err(AppError::GenerationFailed {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| {
            AppError::UpstreamUnavailable(format!("Failed to read generated background: {}", e))
        })?;

        let background = decode_upstream_image(body, "Background generation service").await?;
        tracing::info!(
            width = background.width(),
            height = background.height(),
            content_type = background.content_type(),
            "Background generated"
        );

        Ok(background)
    }
}
