//! Application state shared by every handler.

use std::sync::Arc;

use backdrop_core::Config;
use backdrop_processing::UploadValidator;
use backdrop_services::{BackgroundRemover, CompositePipeline};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Standalone removal client; errors are surfaced, never degraded
    pub remover: Arc<dyn BackgroundRemover>,
    /// Removal + generation for the change-background flow
    pub pipeline: Arc<CompositePipeline>,
    pub validator: UploadValidator,
}

impl AppState {
    pub fn removal_configured(&self) -> bool {
        self.config.remove_bg_api_key().is_some()
    }
}
