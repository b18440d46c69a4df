//! Configuration module
//!
//! This module provides configuration structures for the proxy server and the
//! pipeline clients: server settings, upstream endpoints, timeouts and size caps.

use std::env;
use std::time::Duration;

use crate::constants::{
    DEFAULT_BACKGROUND_SIZE, DEFAULT_GENERATION_TIMEOUT_SECS, DEFAULT_IMAGE_GENERATION_API_URL,
    DEFAULT_PIPELINE_TIMEOUT_SECS, DEFAULT_REMOVAL_TIMEOUT_SECS, DEFAULT_REMOVE_BG_API_URL, MAX_REMOVAL_TIMEOUT_SECS,
    MAX_UPLOAD_SIZE_MB, MIN_REMOVAL_TIMEOUT_SECS,
};

const DEFAULT_PORT: u16 = 3000;
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;

/// Base server configuration
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub http_concurrency_limit: usize,
}

/// Upstream and pipeline configuration
#[derive(Clone, Debug)]
pub struct BackdropConfig {
    pub base: BaseConfig,
    // Background removal service (remove.bg compatible)
    pub remove_bg_api_key: Option<String>,
    pub remove_bg_api_url: String,
    pub remove_bg_timeout_secs: u64,
    // Prompt-to-image generation service (pollinations compatible)
    pub image_generation_api_url: String,
    pub image_generation_timeout_secs: u64,
    pub background_width: u32,
    pub background_height: u32,
    // Upload limits
    pub max_upload_size_bytes: usize,
    // Wall-clock budget for one change-background run
    pub pipeline_timeout_secs: u64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<BackdropConfig>);

impl Config {
    fn inner(&self) -> &BackdropConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_name(&self.inner().base.environment)
    }

    /// Load configuration from the process environment (and `.env` if present).
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_source<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = BackdropConfig::from_source(lookup)?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    // Convenience getters
    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.inner().base.http_concurrency_limit
    }

    pub fn remove_bg_api_key(&self) -> Option<&str> {
        self.inner().remove_bg_api_key.as_deref()
    }

    pub fn remove_bg_api_url(&self) -> &str {
        &self.inner().remove_bg_api_url
    }

    pub fn remove_bg_timeout(&self) -> Duration {
        Duration::from_secs(self.inner().remove_bg_timeout_secs)
    }

    pub fn image_generation_api_url(&self) -> &str {
        &self.inner().image_generation_api_url
    }

    pub fn image_generation_timeout(&self) -> Duration {
        Duration::from_secs(self.inner().image_generation_timeout_secs)
    }

    pub fn background_size(&self) -> (u32, u32) {
        (
            self.inner().background_width,
            self.inner().background_height,
        )
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.inner().max_upload_size_bytes
    }

    pub fn pipeline_timeout(&self) -> Duration {
        Duration::from_secs(self.inner().pipeline_timeout_secs)
    }
}

fn is_production_name(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, anyhow::Error>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number, got '{}'", key, raw)),
        _ => Ok(default),
    }
}

impl BackdropConfig {
    pub fn from_source<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins_str = lookup("CORS_ORIGINS").unwrap_or_else(|| "*".to_string());
        if is_production_name(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            server_port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            cors_origins,
            environment,
            http_concurrency_limit: parse_or(
                &lookup,
                "HTTP_CONCURRENCY_LIMIT",
                HTTP_CONCURRENCY_LIMIT,
            )?
            .max(1),
        };

        let remove_bg_api_key = lookup("REMOVE_BG_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        let remove_bg_timeout_secs: u64 =
            parse_or(&lookup, "REMOVE_BG_TIMEOUT_SECS", DEFAULT_REMOVAL_TIMEOUT_SECS)?;

        let max_upload_size_mb: usize = parse_or(&lookup, "MAX_UPLOAD_SIZE_MB", MAX_UPLOAD_SIZE_MB)?;

        let config = BackdropConfig {
            base,
            remove_bg_api_key,
            remove_bg_api_url: lookup("REMOVE_BG_API_URL")
                .unwrap_or_else(|| DEFAULT_REMOVE_BG_API_URL.to_string()),
            remove_bg_timeout_secs: remove_bg_timeout_secs
                .clamp(MIN_REMOVAL_TIMEOUT_SECS, MAX_REMOVAL_TIMEOUT_SECS),
            image_generation_api_url: lookup("IMAGE_GENERATION_API_URL")
                .unwrap_or_else(|| DEFAULT_IMAGE_GENERATION_API_URL.to_string()),
            image_generation_timeout_secs: parse_or(
                &lookup,
                "IMAGE_GENERATION_TIMEOUT_SECS",
                DEFAULT_GENERATION_TIMEOUT_SECS,
            )?,
            background_width: parse_or(&lookup, "BACKGROUND_WIDTH", DEFAULT_BACKGROUND_SIZE)?,
            background_height: parse_or(&lookup, "BACKGROUND_HEIGHT", DEFAULT_BACKGROUND_SIZE)?,
            max_upload_size_bytes: max_upload_size_mb * 1024 * 1024,
            pipeline_timeout_secs: parse_or(
                &lookup,
                "PIPELINE_TIMEOUT_SECS",
                DEFAULT_PIPELINE_TIMEOUT_SECS,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.image_generation_timeout_secs == 0 {
            return Err(anyhow::anyhow!("IMAGE_GENERATION_TIMEOUT_SECS cannot be 0"));
        }

        if self.pipeline_timeout_secs == 0 {
            return Err(anyhow::anyhow!("PIPELINE_TIMEOUT_SECS cannot be 0"));
        }

        if self.background_width == 0 || self.background_height == 0 {
            return Err(anyhow::anyhow!("Background dimensions cannot be 0"));
        }

        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB cannot be 0"));
        }

        for (name, url) in [
            ("REMOVE_BG_API_URL", &self.remove_bg_api_url),
            ("IMAGE_GENERATION_API_URL", &self.image_generation_api_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(anyhow::anyhow!("{} must be an http(s) URL", name));
            }
        }

        Ok(())
    }
}
