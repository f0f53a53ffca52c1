use std::path::Path;

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::config::VeoConfig;
use crate::error::AppError;
use crate::videogen::types::{
    AspectRatio, GeneratedVideo, GenerationJob, GenerationRequest, OperationError,
};

/// Seam between the pipeline and the generative video service
#[async_trait]
pub trait VideoGenerator: Send + Sync {
    /// Start one long-running generation job
    async fn submit(&self, request: &GenerationRequest) -> Result<GenerationJob, AppError>;

    /// Re-fetch the job's status from the service
    async fn refresh(&self, job: &GenerationJob) -> Result<GenerationJob, AppError>;

    /// Stream the finished video into `dest`, returning the number of bytes written
    async fn download(&self, video: &GeneratedVideo, dest: &Path) -> Result<u64, AppError>;
}

#[derive(Serialize)]
struct VeoRequest<'a> {
    instances: Vec<VeoInstance<'a>>,
    parameters: VeoParameters<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoInstance<'a> {
    prompt: &'a str,
    reference_images: Vec<VeoReferenceImage<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoReferenceImage<'a> {
    image: VeoImage<'a>,
    reference_type: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoImage<'a> {
    bytes_base64_encoded: &'a str,
    mime_type: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoParameters<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    aspect_ratio: Option<AspectRatio>,
    #[serde(skip_serializing_if = "Option::is_none")]
    negative_prompt: Option<&'a str>,
}

#[derive(Deserialize, Debug)]
struct VeoOperation {
    name: String,
    #[serde(default)]
    done: bool,
    response: Option<VeoOperationResult>,
    error: Option<VeoOperationError>,
}

#[derive(Deserialize, Debug)]
struct VeoOperationError {
    code: i32,
    message: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct VeoOperationResult {
    generate_video_response: Option<VeoGenerateVideoResponse>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct VeoGenerateVideoResponse {
    #[serde(default)]
    generated_samples: Vec<VeoSample>,
    #[serde(default)]
    rai_media_filtered_reasons: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct VeoSample {
    video: Option<VeoVideo>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct VeoVideo {
    uri: String,
    mime_type: Option<String>,
}

impl<'a> VeoRequest<'a> {
    fn from_generation(request: &'a GenerationRequest) -> Self {
        let reference_images = request
            .references
            .images()
            .into_iter()
            .map(|r| VeoReferenceImage {
                image: VeoImage {
                    bytes_base64_encoded: &r.bytes_base64,
                    mime_type: &r.mime_type,
                },
                reference_type: &r.reference_type,
            })
            .collect();

        Self {
            instances: vec![VeoInstance {
                prompt: &request.prompt,
                reference_images,
            }],
            parameters: VeoParameters {
                aspect_ratio: request.config.aspect_ratio,
                negative_prompt: request.config.negative_prompt.as_deref(),
            },
        }
    }
}

impl From<VeoOperation> for GenerationJob {
    fn from(op: VeoOperation) -> Self {
        let result = op
            .response
            .and_then(|r| r.generate_video_response)
            .unwrap_or_default();

        GenerationJob {
            name: op.name,
            done: op.done,
            error: op.error.map(|e| OperationError {
                code: e.code,
                message: e.message,
            }),
            videos: result
                .generated_samples
                .into_iter()
                .filter_map(|s| s.video)
                .map(|v| GeneratedVideo {
                    uri: v.uri,
                    mime_type: v.mime_type,
                })
                .collect(),
            filtered_reasons: result.rai_media_filtered_reasons,
        }
    }
}

/// Veo over the Gemini REST API. Holds one reusable HTTP client.
#[derive(Clone)]
pub struct VeoClient {
    http_client: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
}

impl VeoClient {
    pub fn new(config: &VeoConfig) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
        }
    }

    fn api_key(&self) -> Result<&str, AppError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| AppError::Configuration("GOOGLE_API_KEY is not set".to_string()))
    }

    async fn read_operation(response: reqwest::Response) -> Result<GenerationJob, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Upstream(format!(
                "Veo API error ({status}): {error_text}"
            )));
        }

        let op: VeoOperation = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse Veo response: {e}")))?;

        Ok(op.into())
    }
}

#[async_trait]
impl VideoGenerator for VeoClient {
    async fn submit(&self, request: &GenerationRequest) -> Result<GenerationJob, AppError> {
        let api_key = self.api_key()?;
        let url = format!(
            "{}/models/{}:predictLongRunning",
            self.api_base, request.model
        );

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&VeoRequest::from_generation(request))
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to reach Veo API: {e}")))?;

        let job = Self::read_operation(response).await?;
        info!("Video generation started with operation: {}", job.name);
        Ok(job)
    }

    async fn refresh(&self, job: &GenerationJob) -> Result<GenerationJob, AppError> {
        let api_key = self.api_key()?;
        let url = format!("{}/{}", self.api_base, job.name);

        let response = self
            .http_client
            .get(&url)
            .header("x-goog-api-key", api_key)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to poll operation: {e}")))?;

        Self::read_operation(response).await
    }

    async fn download(&self, video: &GeneratedVideo, dest: &Path) -> Result<u64, AppError> {
        let api_key = self.api_key()?;

        let response = self
            .http_client
            .get(&video.uri)
            .header("x-goog-api-key", api_key)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::Upstream(format!("Failed to download video: {e}")))?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| AppError::Upstream(format!("Video download interrupted: {e}")))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        info!("Downloaded {} bytes to {}", written, dest.display());
        Ok(written)
    }
}
