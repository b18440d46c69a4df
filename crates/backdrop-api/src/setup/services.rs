//! Upstream clients and the change-background pipeline

use std::sync::Arc;

use anyhow::{Context, Result};
use backdrop_core::Config;
use backdrop_processing::UploadValidator;
use backdrop_services::{
    BackgroundGenerator, BackgroundRemover, CompositePipeline, PipelineConfig,
    PollinationsService, RemoveBgConfig, RemoveBgService,
};

use crate::state::AppState;

/// Build the removal and generation clients and wire them into `AppState`
pub fn initialize_services(config: &Config) -> Result<Arc<AppState>> {
    let remove_bg = RemoveBgService::new(RemoveBgConfig::from(config))
        .context("Failed to initialize background removal client")?;
    if !remove_bg.is_configured() {
        tracing::warn!(
            "REMOVE_BG_API_KEY is not set; background removal requests will fail until it is configured"
        );
    }
    let remover: Arc<dyn BackgroundRemover> = Arc::new(remove_bg);

    let generator: Arc<dyn BackgroundGenerator> = Arc::new(
        PollinationsService::from_config(config)
            .context("Failed to initialize background generation client")?,
    );

    let pipeline = CompositePipeline::new(
        remover.clone(),
        generator,
        PipelineConfig::from(config),
    );

    tracing::info!(
        remove_bg_api_url = %config.remove_bg_api_url(),
        image_generation_api_url = %config.image_generation_api_url(),
        removal_timeout_secs = config.remove_bg_timeout().as_secs(),
        generation_timeout_secs = config.image_generation_timeout().as_secs(),
        "Upstream clients initialized"
    );

    Ok(Arc::new(AppState {
        config: config.clone(),
        remover,
        pipeline: Arc::new(pipeline),
        validator: UploadValidator::new(config.max_upload_size_bytes()),
    }))
}
