use std::path::Path;

use async_trait::async_trait;

use crate::error::AppError;

pub mod catalog;
pub mod s3;

pub use s3::S3Store;

/// One page of a prefix listing
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub keys: Vec<String>,
    pub next_continuation_token: Option<String>,
}

/// Remote key-addressed storage for finished videos
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload_file(&self, key: &str, path: &Path, content_type: &str)
        -> Result<(), AppError>;

    async fn list_page(
        &self,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<ListPage, AppError>;

    fn public_url(&self, key: &str) -> String;
}

/// Where a finished video ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub key: String,
    pub url: String,
}

/// Unique object key under `prefix`: unix millis plus a random suffix, so two
/// videos finishing in the same millisecond never overwrite each other.
pub fn generate_object_key(prefix: &str) -> String {
    let timestamp = chrono::Utc::now().timestamp_millis();
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}/{timestamp}-{}.mp4",
        prefix.trim_end_matches('/'),
        &suffix[..12]
    )
}
