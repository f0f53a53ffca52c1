use std::path::Path;

use crate::error::AppError;
use crate::videogen::types::{ReferenceImage, ReferencePair, UploadedImage};

const ASSET_MIME_TYPE: &str = "image/png";

/// Pair the caller's image with the fixed asset. The asset is read from disk on
/// every call so it can be swapped without a restart.
pub async fn assemble_references(
    asset_path: &Path,
    uploaded: &UploadedImage,
) -> Result<ReferencePair, AppError> {
    let asset_bytes = tokio::fs::read(asset_path).await.map_err(|e| {
        AppError::Configuration(format!(
            "Failed to read reference asset {}: {e}",
            asset_path.display()
        ))
    })?;

    ReferencePair::new(
        uploaded.to_reference(),
        ReferenceImage::encode(&asset_bytes, ASSET_MIME_TYPE),
    )
}
