pub mod pollinations;
pub mod remove_bg;

use backdrop_core::AppError;
use backdrop_processing::ImageAsset;
use bytes::Bytes;

/// Decode an upstream success body off the async runtime.
///
/// Bodies that are not decodable images are reported as malformed
/// responses, not as client decode errors.
pub(crate) async fn decode_upstream_image(body: Bytes, service: &str) -> Result<ImageAsset, AppError> {
    let service_name = service.to_string();
    tokio::task::spawn_blocking(move || ImageAsset::decode(body))
        .await
        .map_err(|e| AppError::Internal(format!("Image decode task failed: {}", e)))?
        .map_err(|e| {
            AppError::MalformedResponse(format!(
                "{} returned a body that is not an image: {}",
                service_name, e
            ))
        })
}
