//! Configuration validation
//!
//! Checks that only matter for the server surface; value-level checks live in
//! `Config::validate`.

use anyhow::Result;
use backdrop_core::Config;

pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    let is_production = config.is_production();
    let env_var = std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .ok();
    if is_production && env_var.is_none() {
        tracing::warn!(
            "Production mode detected but ENVIRONMENT/APP_ENV not set - error details may leak"
        );
    }

    if is_production && config.cors_origins().iter().any(|o| o == "*") {
        return Err(anyhow::anyhow!(
            "CORS configured to allow all origins (*) in production. \
            Set specific allowed origins via CORS_ORIGINS."
        ));
    }

    if config.http_concurrency_limit() == 0 {
        return Err(anyhow::anyhow!("HTTP_CONCURRENCY_LIMIT cannot be 0"));
    }

    if is_production && config.remove_bg_api_key().is_none() {
        tracing::warn!("REMOVE_BG_API_KEY is not set in production");
    }

    Ok(())
}
