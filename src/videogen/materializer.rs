use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::config::{DeliveryConfig, DeliveryMode};
use crate::consts::VIDEO_CONTENT_TYPE;
use crate::error::AppError;
use crate::storage::{generate_object_key, ObjectStore, StoredArtifact};
use crate::videogen::types::GeneratedVideo;
use crate::videogen::veo::VideoGenerator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    LocalFile { file: String },
    ObjectStore(StoredArtifact),
}

/// Download `video` and hand it over according to the configured delivery mode
pub async fn materialize(
    generator: &dyn VideoGenerator,
    store: Option<&dyn ObjectStore>,
    video: &GeneratedVideo,
    delivery: &DeliveryConfig,
    prefix: &str,
) -> Result<Delivery, AppError> {
    match delivery.mode {
        DeliveryMode::Local => save_locally(generator, video, &delivery.local_output).await,
        DeliveryMode::ObjectStore => {
            let store = store.ok_or_else(|| {
                AppError::Configuration(
                    "Object storage is not configured (bucket, region and access keys are required)"
                        .to_string(),
                )
            })?;
            let temp_dir = delivery
                .temp_dir
                .clone()
                .unwrap_or_else(std::env::temp_dir);
            upload_to_store(generator, store, video, prefix, &temp_dir).await
        }
    }
}

/// Write the video to `output`, replacing it atomically once the download is complete
async fn save_locally(
    generator: &dyn VideoGenerator,
    video: &GeneratedVideo,
    output: &Path,
) -> Result<Delivery, AppError> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    tokio::fs::create_dir_all(&dir).await?;

    let staging = NamedTempFile::new_in(&dir)?;
    generator.download(video, staging.path()).await?;
    staging
        .persist(output)
        .map_err(|e| AppError::Storage(format!("Failed to save {}: {e}", output.display())))?;

    info!("Saved generated video to {}", output.display());
    Ok(Delivery::LocalFile {
        file: output.display().to_string(),
    })
}

/// Stage the video in a temp file, upload it under a fresh key, then drop the
/// temp file. The file is removed on every path, including a failed upload.
async fn upload_to_store(
    generator: &dyn VideoGenerator,
    store: &dyn ObjectStore,
    video: &GeneratedVideo,
    prefix: &str,
    temp_dir: &Path,
) -> Result<Delivery, AppError> {
    let timestamp = chrono::Utc::now().timestamp_millis();
    let staging = tempfile::Builder::new()
        .prefix(&format!("{timestamp}-"))
        .suffix(".mp4")
        .tempfile_in(temp_dir)?;

    generator.download(video, staging.path()).await?;

    let key = generate_object_key(prefix);
    store
        .upload_file(&key, staging.path(), VIDEO_CONTENT_TYPE)
        .await?;

    if let Err(e) = staging.close() {
        warn!("Failed to remove staged video: {e}");
    }

    let url = store.public_url(&key);
    info!("Uploaded generated video to {}", url);
    Ok(Delivery::ObjectStore(StoredArtifact { key, url }))
}
