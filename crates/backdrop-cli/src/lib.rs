use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;

/// Media type implied by a file extension, if it names an image format.
pub fn content_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// `explicit` when given, otherwise `default_name` next to `input`.
pub fn output_path(input: &Path, explicit: Option<PathBuf>, default_name: &str) -> PathBuf {
    explicit.unwrap_or_else(|| match input.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(default_name),
        _ => PathBuf::from(default_name),
    })
}

/// Write `bytes` to `path`, creating missing parent directories.
pub async fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// What a command wrote, printed as JSON on stdout.
#[derive(Debug, Serialize)]
pub struct CommandReport {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub content_type: String,
    pub bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<String>,
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
