//! In-memory stand-ins for the generation service and the object store.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::consts::s3_public_url;
use crate::error::AppError;
use crate::storage::{ListPage, ObjectStore};
use crate::videogen::types::{GeneratedVideo, GenerationJob, GenerationRequest};
use crate::videogen::veo::VideoGenerator;

pub const FAKE_VIDEO_BYTES: &[u8] = b"\x00\x00\x00\x18ftypmp42fake-video";

pub const FAKE_BUCKET: &str = "test-bucket";
pub const FAKE_REGION: &str = "us-east-1";

pub struct FakeGenerator {
    complete_after: usize,
    refreshes: AtomicUsize,
    refresh_error: Option<String>,
    submitted: Mutex<Vec<GenerationRequest>>,
}

impl FakeGenerator {
    /// Job reports done on the `polls`-th refresh; 0 means done at submission
    pub fn completing_after(polls: usize) -> Self {
        Self {
            complete_after: polls,
            refreshes: AtomicUsize::new(0),
            refresh_error: None,
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_refresh(mut self, message: &str) -> Self {
        self.refresh_error = Some(message.to_string());
        self
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<GenerationRequest> {
        self.submitted.lock().unwrap().clone()
    }

    fn job(&self, done: bool) -> GenerationJob {
        let mut job = GenerationJob::pending("models/veo-3.1-generate-preview/operations/fake");
        if done {
            job.done = true;
            job.videos.push(GeneratedVideo {
                uri: "https://example.com/files/fake:download?alt=media".to_string(),
                mime_type: Some("video/mp4".to_string()),
            });
        }
        job
    }
}

#[async_trait]
impl VideoGenerator for FakeGenerator {
    async fn submit(&self, request: &GenerationRequest) -> Result<GenerationJob, AppError> {
        self.submitted.lock().unwrap().push(request.clone());
        Ok(self.job(self.complete_after == 0))
    }

    async fn refresh(&self, _job: &GenerationJob) -> Result<GenerationJob, AppError> {
        if let Some(message) = &self.refresh_error {
            return Err(AppError::Upstream(message.clone()));
        }
        let polls = self.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(self.job(polls >= self.complete_after))
    }

    async fn download(&self, _video: &GeneratedVideo, dest: &Path) -> Result<u64, AppError> {
        tokio::fs::write(dest, FAKE_VIDEO_BYTES).await?;
        Ok(FAKE_VIDEO_BYTES.len() as u64)
    }
}

#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub key: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub staged_path: PathBuf,
}

pub struct FakeStore {
    page_size: usize,
    keys: Mutex<Vec<String>>,
    uploads: Mutex<Vec<RecordedUpload>>,
    list_calls: AtomicUsize,
    upload_error: Option<String>,
    list_error: Option<String>,
}

impl FakeStore {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            keys: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
            list_calls: AtomicUsize::new(0),
            upload_error: None,
            list_error: None,
        }
    }

    pub fn with_keys(self, keys: Vec<String>) -> Self {
        *self.keys.lock().unwrap() = keys;
        self
    }

    pub fn fail_upload(mut self, message: &str) -> Self {
        self.upload_error = Some(message.to_string());
        self
    }

    pub fn fail_list(mut self, message: &str) -> Self {
        self.list_error = Some(message.to_string());
        self
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn upload_file(
        &self,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<(), AppError> {
        if let Some(message) = &self.upload_error {
            return Err(AppError::Storage(message.clone()));
        }

        let bytes = tokio::fs::read(path).await?;
        self.uploads.lock().unwrap().push(RecordedUpload {
            key: key.to_string(),
            content_type: content_type.to_string(),
            bytes,
            staged_path: path.to_path_buf(),
        });
        self.keys.lock().unwrap().push(key.to_string());
        Ok(())
    }

    async fn list_page(
        &self,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<ListPage, AppError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.list_error {
            return Err(AppError::Storage(message.clone()));
        }

        let matching: Vec<String> = self
            .keys
            .lock()
            .unwrap()
            .iter()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();

        let start = continuation_token
            .map(|t| t.parse::<usize>().unwrap())
            .unwrap_or(0);
        let end = (start + self.page_size).min(matching.len());

        Ok(ListPage {
            keys: matching[start..end].to_vec(),
            next_continuation_token: (end < matching.len()).then(|| end.to_string()),
        })
    }

    fn public_url(&self, key: &str) -> String {
        s3_public_url(FAKE_BUCKET, FAKE_REGION, key)
    }
}

const BOUNDARY: &str = "reelgen-test-boundary";

/// Build a multipart/form-data body from `(name, content_type, bytes)` fields.
/// Fields with a content type are sent as files.
pub fn multipart_body(fields: &[(&str, Option<&str>, &[u8])]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for (name, content_type, bytes) in fields {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match content_type {
            Some(ct) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{name}.bin\"\r\nContent-Type: {ct}\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}
