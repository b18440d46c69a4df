//! Composite pipeline
//!
//! normalize -> { remove background (best effort), generate background } ->
//! composite. Removal and generation are independent and run concurrently;
//! the first terminal failure cancels the other. The whole run is bounded by
//! one timeout, and dropping the run cancels any in-flight request.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use backdrop_core::constants::{DEFAULT_BACKGROUND_SIZE, DEFAULT_PIPELINE_TIMEOUT_SECS};
use backdrop_core::{AppError, Config};
use backdrop_processing::{
    CompositeOptions, Compositor, ImageAsset, ImageNormalizer, NormalizeOptions, ProcessingError,
};
use bytes::Bytes;

use crate::services::pollinations::BackgroundGenerator;
use crate::services::remove_bg::{BackgroundRemover, RemovalOptions, RemovalOutcome};

pub const BLANK_PROMPT_MESSAGE: &str = "Please enter a prompt for the background";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Validate,
    Normalize,
    Removal,
    Generation,
    Compositing,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Validate => "validate",
            PipelineStage::Normalize => "normalize",
            PipelineStage::Removal => "removal",
            PipelineStage::Generation => "generation",
            PipelineStage::Compositing => "compositing",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: PipelineStage,
        #[source]
        source: AppError,
    },

    #[error("Pipeline exceeded its {0:?} budget")]
    TimedOut(Duration),
}

impl PipelineError {
    fn at(stage: PipelineStage) -> impl FnOnce(AppError) -> PipelineError {
        move |source| PipelineError::Stage { stage, source }
    }

    /// Stage that failed, if the run did not simply run out of time
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            PipelineError::Stage { stage, .. } => Some(*stage),
            PipelineError::TimedOut(_) => None,
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Stage { source, .. } => source,
            PipelineError::TimedOut(budget) => {
                AppError::Timeout(format!("Pipeline exceeded {}s", budget.as_secs()))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub normalize: NormalizeOptions,
    pub composite: CompositeOptions,
    /// Size requested from the generator
    pub background_size: (u32, u32),
    pub max_input_bytes: usize,
    /// Wall-clock budget for one run
    pub timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            normalize: NormalizeOptions::for_composite(),
            composite: CompositeOptions::default(),
            background_size: (DEFAULT_BACKGROUND_SIZE, DEFAULT_BACKGROUND_SIZE),
            max_input_bytes: backdrop_core::constants::MAX_UPLOAD_SIZE_MB * 1024 * 1024,
            timeout: Duration::from_secs(DEFAULT_PIPELINE_TIMEOUT_SECS),
        }
    }
}

impl From<&Config> for PipelineConfig {
    fn from(config: &Config) -> Self {
        Self {
            background_size: config.background_size(),
            max_input_bytes: config.max_upload_size_bytes(),
            timeout: config.pipeline_timeout(),
            ..Self::default()
        }
    }
}

/// Subject and background, ready for compositing
#[derive(Debug)]
pub struct Layers {
    pub subject: RemovalOutcome,
    pub background: ImageAsset,
}

#[derive(Debug)]
pub struct PipelineOutput {
    pub composite: ImageAsset,
    /// Why removal fell back to the original, when it did
    pub degraded: Option<AppError>,
}

pub struct CompositePipeline {
    remover: Arc<dyn BackgroundRemover>,
    generator: Arc<dyn BackgroundGenerator>,
    config: PipelineConfig,
}

impl CompositePipeline {
    pub fn new(
        remover: Arc<dyn BackgroundRemover>,
        generator: Arc<dyn BackgroundGenerator>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            remover,
            generator,
            config,
        }
    }

    /// Run the whole pipeline on raw upload bytes.
    ///
    /// `content_type` is the declared media type of the upload, if known.
    pub async fn generate_composite(
        &self,
        original: Bytes,
        content_type: Option<&str>,
        prompt: &str,
    ) -> Result<PipelineOutput, PipelineError> {
        let content_type = content_type.map(str::to_string);
        self.with_budget(async move {
            let prompt = validate_prompt(prompt)?;
            let normalized = self.normalize(original, content_type).await?;
            let layers = self.fetch_layers_inner(normalized, prompt).await?;
            self.composite(layers).await
        })
        .await
    }

    /// Remove the subject's background and generate a new one, without
    /// compositing. `subject` is used as-is.
    pub async fn fetch_layers(
        &self,
        subject: ImageAsset,
        prompt: &str,
    ) -> Result<Layers, PipelineError> {
        self.with_budget(async move {
            let prompt = validate_prompt(prompt)?;
            self.fetch_layers_inner(subject, prompt).await
        })
        .await
    }

    async fn with_budget<T, F>(&self, run: F) -> Result<T, PipelineError>
    where
        F: std::future::Future<Output = Result<T, PipelineError>>,
    {
        let budget = self.config.timeout;
        match tokio::time::timeout(budget, run).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(budget_secs = budget.as_secs(), "Pipeline timed out");
                Err(PipelineError::TimedOut(budget))
            }
        }
    }

    async fn normalize(
        &self,
        original: Bytes,
        content_type: Option<String>,
    ) -> Result<ImageAsset, PipelineError> {
        let normalizer = ImageNormalizer::new(self.config.max_input_bytes);
        let options = self.config.normalize;

        run_blocking(move || normalizer.normalize(original, content_type.as_deref(), options))
            .await
            .map_err(PipelineError::at(PipelineStage::Normalize))
    }

    async fn fetch_layers_inner(
        &self,
        subject: ImageAsset,
        prompt: &str,
    ) -> Result<Layers, PipelineError> {
        let (width, height) = self.config.background_size;
        let removal_options = RemovalOptions::for_composite();

        let removal = async {
            self.remover
                .remove_or_degrade(subject, &removal_options)
                .await
                .map_err(PipelineError::at(PipelineStage::Removal))
        };
        let generation = async {
            self.generator
                .generate_background(prompt, width, height)
                .await
                .map_err(PipelineError::at(PipelineStage::Generation))
        };

        let (subject, background) = tokio::try_join!(removal, generation)?;
        Ok(Layers {
            subject,
            background,
        })
    }

    async fn composite(&self, layers: Layers) -> Result<PipelineOutput, PipelineError> {
        let (cutout, degraded) = match layers.subject {
            RemovalOutcome::Removed(cutout) => (cutout, None),
            RemovalOutcome::Degraded { original, reason } => (original, Some(reason)),
        };
        let background = layers.background;
        let options = self.config.composite;

        let composite = run_blocking(move || Compositor::composite(cutout, background, options))
            .await
            .map_err(PipelineError::at(PipelineStage::Compositing))?;

        tracing::info!(
            canvas_size = options.canvas_size,
            degraded = degraded.is_some(),
            size = composite.encoded().len(),
            "Composite generated"
        );

        Ok(PipelineOutput {
            composite,
            degraded,
        })
    }
}

/// Rejects blank prompts; the prompt itself is forwarded untouched.
fn validate_prompt(prompt: &str) -> Result<&str, PipelineError> {
    if prompt.trim().is_empty() {
        return Err(PipelineError::Stage {
            stage: PipelineStage::Validate,
            source: AppError::InvalidInput(BLANK_PROMPT_MESSAGE.to_string()),
        });
    }
    Ok(prompt)
}

async fn run_blocking<T, F>(task: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, ProcessingError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| AppError::Internal(format!("Image processing task failed: {}", e)))?
        .map_err(AppError::from)
}
