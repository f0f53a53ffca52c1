use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};

use crate::consts::REFERENCE_TYPE_ASSET;
use crate::error::AppError;

/// Raw image as received in the multipart upload
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl UploadedImage {
    pub fn to_reference(&self) -> ReferenceImage {
        ReferenceImage::encode(&self.bytes, &self.mime_type)
    }
}

/// Image anchoring the generated video, encoded for transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceImage {
    pub bytes_base64: String,
    pub mime_type: String,
    pub reference_type: String,
}

impl ReferenceImage {
    pub fn encode(bytes: &[u8], mime_type: &str) -> Self {
        Self {
            bytes_base64: BASE64.encode(bytes),
            mime_type: mime_type.to_string(),
            reference_type: REFERENCE_TYPE_ASSET.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes_base64.is_empty()
    }
}

/// The two references every job carries: the caller's image and the fixed asset
#[derive(Debug, Clone)]
pub struct ReferencePair {
    uploaded: ReferenceImage,
    asset: ReferenceImage,
}

impl ReferencePair {
    pub fn new(uploaded: ReferenceImage, asset: ReferenceImage) -> Result<Self, AppError> {
        if uploaded.is_empty() {
            return Err(AppError::Validation("Uploaded image is empty".to_string()));
        }
        if asset.is_empty() {
            return Err(AppError::Configuration(
                "Reference asset image is empty".to_string(),
            ));
        }
        Ok(Self { uploaded, asset })
    }

    /// Uploaded image first, asset second
    pub fn images(&self) -> [&ReferenceImage; 2] {
        [&self.uploaded, &self.asset]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum AspectRatio {
    #[serde(rename = "16:9")]
    #[strum(serialize = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    #[strum(serialize = "9:16")]
    Portrait,
}

#[derive(Debug, Clone, Default)]
pub struct GenerationConfig {
    pub aspect_ratio: Option<AspectRatio>,
    pub negative_prompt: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub references: ReferencePair,
    pub config: GenerationConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationError {
    pub code: i32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedVideo {
    pub uri: String,
    pub mime_type: Option<String>,
}

/// Snapshot of a long-running generation operation as last reported by the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationJob {
    pub name: String,
    pub done: bool,
    pub error: Option<OperationError>,
    pub videos: Vec<GeneratedVideo>,
    pub filtered_reasons: Vec<String>,
}

impl GenerationJob {
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            done: false,
            error: None,
            videos: Vec::new(),
            filtered_reasons: Vec::new(),
        }
    }

    /// First generated video of a finished job
    pub fn first_video(&self) -> Result<&GeneratedVideo, AppError> {
        if !self.done {
            return Err(AppError::Upstream(format!(
                "Operation {} has not completed",
                self.name
            )));
        }

        if let Some(error) = &self.error {
            return Err(AppError::Upstream(format!(
                "Operation failed with error code {}: {}",
                error.code, error.message
            )));
        }

        if !self.filtered_reasons.is_empty() {
            return Err(AppError::Upstream(format!(
                "Content was filtered by the provider: {}",
                self.filtered_reasons.join("; ")
            )));
        }

        self.videos.first().ok_or_else(|| {
            AppError::Upstream("Operation completed but no videos were generated".to_string())
        })
    }
}
