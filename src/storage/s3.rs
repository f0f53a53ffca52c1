use std::path::Path;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::{
    config::Credentials, error::DisplayErrorContext, primitives::ByteStream, Client,
};
use tracing::info;

use crate::config::{non_blank, StorageConfig};
use crate::consts::s3_public_url;
use crate::error::AppError;
use crate::storage::{ListPage, ObjectStore};

/// S3 bucket holding generated videos. Built once at startup and shared.
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
    region: String,
}

impl S3Store {
    /// Returns `None` unless bucket, region and both keys are configured
    pub async fn from_config(config: &StorageConfig) -> Option<Self> {
        let (Some(bucket), Some(region), Some(access_key), Some(secret_key)) = (
            non_blank(&config.bucket),
            non_blank(&config.region),
            non_blank(&config.access_key),
            non_blank(&config.secret_key),
        ) else {
            return None;
        };
        let (bucket, region) = (bucket.to_string(), region.to_string());

        let credentials = Credentials::new(access_key, secret_key, None, None, "reelgen-config");

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .credentials_provider(credentials);
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let aws_config = loader.load().await;

        Some(Self {
            client: Client::new(&aws_config),
            bucket,
            region,
        })
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn upload_file(
        &self,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<(), AppError> {
        info!("Uploading video to S3: {}/{}", self.bucket, key);

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to read {}: {e}", path.display())))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                AppError::Storage(format!(
                    "Failed to upload video to S3: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(())
    }

    async fn list_page(
        &self,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<ListPage, AppError> {
        let response = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .set_continuation_token(continuation_token)
            .send()
            .await
            .map_err(|e| {
                AppError::Storage(format!(
                    "Failed to list objects from S3: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        let keys = response
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_string))
            .collect();

        let next_continuation_token = if response.is_truncated().unwrap_or(false) {
            response.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        Ok(ListPage {
            keys,
            next_continuation_token,
        })
    }

    fn public_url(&self, key: &str) -> String {
        s3_public_url(&self.bucket, &self.region, key)
    }
}
