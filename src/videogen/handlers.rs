use std::sync::Arc;

use axum::{
    extract::{
        multipart::{Multipart, MultipartRejection},
        State,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::consts::SUCCESS_MESSAGE;
use crate::error::{AppError, ErrorBody};
use crate::storage::catalog::list_videos;
use crate::videogen::intake::read_uploaded_image;
use crate::videogen::materializer::Delivery;
use crate::videogen::pipeline;

/// Multipart form accepted by `/generate-video`
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct GenerateVideoForm {
    /// Image anchoring the generated video (PNG)
    #[schema(value_type = String)]
    image: Vec<u8>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, PartialEq, Eq)]
pub struct GenerateVideoResponse {
    pub message: String,
    /// Local file name, set when videos are kept on disk
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Public URL, set when videos are uploaded to the object store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

impl From<Delivery> for GenerateVideoResponse {
    fn from(delivery: Delivery) -> Self {
        let (file, video_url) = match delivery {
            Delivery::LocalFile { file } => (Some(file), None),
            Delivery::ObjectStore(artifact) => (None, Some(artifact.url)),
        };
        Self {
            message: SUCCESS_MESSAGE.to_string(),
            file,
            video_url,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct VideoListResponse {
    pub videos: Vec<String>,
}

#[utoipa::path(
    post,
    path = "/generate-video",
    request_body(content = GenerateVideoForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Video generated and delivered", body = GenerateVideoResponse),
        (status = 400, description = "Missing 'image' file", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody),
        (status = 502, description = "Generation service failure", body = ErrorBody),
        (status = 503, description = "Service not configured", body = ErrorBody),
        (status = 504, description = "Generation did not finish in time", body = ErrorBody),
    ),
    tag = "VideoGen"
)]
#[instrument(skip_all)]
pub async fn generate_video(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerateVideoResponse>, AppError> {
    let uploaded = read_uploaded_image(multipart).await?;

    tracing::info!(
        size = uploaded.bytes.len(),
        mime_type = %uploaded.mime_type,
        "Generating video..."
    );

    let delivery = pipeline::generate_video(&state, uploaded).await?;

    Ok(Json(delivery.into()))
}

#[utoipa::path(
    get,
    path = "/get-videos",
    responses(
        (status = 200, description = "Public URLs of every stored video", body = VideoListResponse),
        (status = 500, description = "Storage failure", body = ErrorBody),
        (status = 503, description = "Object storage not configured", body = ErrorBody),
    ),
    tag = "VideoGen"
)]
#[instrument(skip_all)]
pub async fn get_videos(
    State(state): State<Arc<AppState>>,
) -> Result<Json<VideoListResponse>, AppError> {
    let store = state.store.as_deref().ok_or_else(|| {
        AppError::Configuration("Object storage is not configured".to_string())
    })?;

    let videos = list_videos(store, &state.config.storage.prefix).await?;

    Ok(Json(VideoListResponse { videos }))
}
