//! Backdrop CLI: run the background pipeline against local files.
//!
//! Upstream settings come from the same environment as the server
//! (REMOVE_BG_API_KEY, REMOVE_BG_API_URL, IMAGE_GENERATION_API_URL, ...).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use backdrop_cli::{content_type_for_path, init_tracing, output_path, write_output, CommandReport};
use backdrop_core::constants::{
    CHANGED_BACKGROUND_FILENAME, DEFAULT_JPEG_QUALITY, DEFAULT_MAX_DIMENSION,
    DEFAULT_PIPELINE_TIMEOUT_SECS, DEFAULT_REMOVAL_QUALITY, REFERENCE_CANVAS_SIZE,
    REMOVED_BACKGROUND_FILENAME,
};
use backdrop_core::Config;
use backdrop_services::{
    BackgroundRemover, CompositeOptions, CompositePipeline, ImageEncoding, ImageNormalizer,
    NormalizeOptions, OutputFormat, PipelineConfig, PollinationsService, RemovalOptions,
    RemoveBgConfig, RemoveBgService,
};
use bytes::Bytes;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "backdrop", about = "Remove and replace image backgrounds")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cut out the subject and place it on a generated background
    Composite {
        /// Path to the source photo
        input: PathBuf,
        /// Description of the new background
        #[arg(long)]
        prompt: String,
        /// Output PNG path
        #[arg(long)]
        output: Option<PathBuf>,
        /// Square canvas size in pixels (512 or 768 in the web client)
        #[arg(long, default_value_t = REFERENCE_CANVAS_SIZE)]
        canvas_size: u32,
        /// Longest side of the normalized upload
        #[arg(long, default_value_t = DEFAULT_MAX_DIMENSION)]
        max_dimension: u32,
        /// Time budget for the whole run
        #[arg(long, default_value_t = DEFAULT_PIPELINE_TIMEOUT_SECS)]
        timeout_secs: u64,
        /// Soften the subject's edges with a radial alpha falloff
        #[arg(long)]
        feather: bool,
    },
    /// Remove the background only
    Remove {
        /// Path to the source photo
        input: PathBuf,
        /// Quality hint forwarded to the removal service
        #[arg(long, default_value = DEFAULT_REMOVAL_QUALITY)]
        quality: String,
        /// Output PNG path
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Downscale and re-encode an image the way uploads are prepared
    Normalize {
        /// Path to the source image
        input: PathBuf,
        /// Longest side of the output
        #[arg(long, default_value_t = DEFAULT_MAX_DIMENSION)]
        max_dimension: u32,
        /// Output format: jpeg or png
        #[arg(long, default_value = "jpeg")]
        format: String,
        /// JPEG quality (1-100)
        #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY)]
        quality: u8,
        /// Output path
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

async fn read_input(path: &Path) -> anyhow::Result<Bytes> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(Bytes::from(data))
}

fn print_report(report: &CommandReport) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(report).context("Serialize report")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env().context("Invalid configuration")?;

    match cli.command {
        Commands::Composite {
            input,
            prompt,
            output,
            canvas_size,
            max_dimension,
            timeout_secs,
            feather,
        } => {
            let remover: Arc<dyn BackgroundRemover> =
                Arc::new(RemoveBgService::new(RemoveBgConfig::from(&config))?);
            let generator = Arc::new(PollinationsService::from_config(&config)?);
            let pipeline_config = PipelineConfig {
                normalize: NormalizeOptions::new(
                    max_dimension,
                    ImageEncoding::jpeg(DEFAULT_JPEG_QUALITY),
                ),
                composite: CompositeOptions::new(canvas_size).with_feather(feather),
                timeout: Duration::from_secs(timeout_secs),
                ..PipelineConfig::from(&config)
            };
            let pipeline = CompositePipeline::new(remover, generator, pipeline_config);

            let original = read_input(&input).await?;
            let result = pipeline
                .generate_composite(original, content_type_for_path(&input), &prompt)
                .await
                .context("Background replacement failed")?;

            let output = output_path(&input, output, CHANGED_BACKGROUND_FILENAME);
            let composite = result.composite;
            write_output(&output, composite.encoded()).await?;

            print_report(&CommandReport {
                width: composite.width(),
                height: composite.height(),
                content_type: composite.content_type().to_string(),
                bytes: composite.encoded().len(),
                degraded: result.degraded.map(|reason| reason.to_string()),
                output,
            })?;
        }
        Commands::Remove {
            input,
            quality,
            output,
        } => {
            let remover = RemoveBgService::new(RemoveBgConfig::from(&config))?;
            let normalizer = ImageNormalizer::new(config.max_upload_size_bytes());
            let original = read_input(&input).await?;
            let content_type = content_type_for_path(&input);

            let prepared = tokio::task::spawn_blocking(move || {
                normalizer.normalize(original, content_type, NormalizeOptions::for_removal())
            })
            .await
            .context("Normalize task failed")??;

            let cutout = remover
                .remove_background(
                    prepared.encoded().clone(),
                    prepared.content_type(),
                    &RemovalOptions::standalone(quality),
                )
                .await
                .context("Background removal failed")?;

            let output = output_path(&input, output, REMOVED_BACKGROUND_FILENAME);
            write_output(&output, cutout.encoded()).await?;

            print_report(&CommandReport {
                width: cutout.width(),
                height: cutout.height(),
                content_type: cutout.content_type().to_string(),
                bytes: cutout.encoded().len(),
                degraded: None,
                output,
            })?;
        }
        Commands::Normalize {
            input,
            max_dimension,
            format,
            quality,
            output,
        } => {
            let format = OutputFormat::parse(&format).map_err(anyhow::Error::msg)?;
            let encoding = match format {
                OutputFormat::Jpeg => ImageEncoding::jpeg(quality),
                OutputFormat::Png => ImageEncoding::png(),
            };
            let normalizer = ImageNormalizer::new(config.max_upload_size_bytes());
            let original = read_input(&input).await?;
            let content_type = content_type_for_path(&input);

            let normalized = tokio::task::spawn_blocking(move || {
                normalizer.normalize(
                    original,
                    content_type,
                    NormalizeOptions::new(max_dimension, encoding),
                )
            })
            .await
            .context("Normalize task failed")??;

            let default_name = format!("normalized.{}", format.extension());
            let output = output_path(&input, output, &default_name);
            write_output(&output, normalized.encoded()).await?;

            print_report(&CommandReport {
                width: normalized.width(),
                height: normalized.height(),
                content_type: normalized.content_type().to_string(),
                bytes: normalized.encoded().len(),
                degraded: None,
                output,
            })?;
        }
    }

    Ok(())
}
