//! Backdrop Services Layer
//!
//! Upstream clients (background removal, background generation) and the
//! composite pipeline that sequences them with the local compositor. The API
//! and CLI crates depend on this facade rather than on the clients directly.

pub mod pipeline;
pub mod services;

pub use backdrop_processing::{
    CompositeOptions, Compositor, ImageAsset, ImageEncoding, ImageNormalizer, NormalizeOptions,
    OutputFormat, UploadValidator,
};
pub use pipeline::{
    CompositePipeline, Layers, PipelineConfig, PipelineError, PipelineOutput, PipelineStage,
};
pub use services::pollinations::{BackgroundGenerator, PollinationsService};
pub use services::remove_bg::{
    BackgroundRemover, RemovalOptions, RemovalOutcome, RemoveBgConfig, RemoveBgService,
};
