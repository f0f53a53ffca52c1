use axum::extract::multipart::{Multipart, MultipartRejection};

use crate::error::AppError;
use crate::videogen::types::UploadedImage;

pub const IMAGE_FIELD: &str = "image";

const FALLBACK_MIME_TYPE: &str = "image/png";

fn missing_image() -> AppError {
    AppError::Validation("Missing 'image' file".to_string())
}

/// Pull the `image` file part out of a multipart upload.
/// Only presence is checked, content is passed through untouched.
pub async fn read_uploaded_image(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<UploadedImage, AppError> {
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!("Rejected non-multipart upload: {e}");
        missing_image()
    })?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        // plain text fields never count as the upload
        if field.name() != Some(IMAGE_FIELD) || field.file_name().is_none() {
            continue;
        }

        let mime_type = field
            .content_type()
            .filter(|ct| ct.starts_with("image/"))
            .unwrap_or(FALLBACK_MIME_TYPE)
            .to_string();

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read 'image' file: {e}")))?;

        if bytes.is_empty() {
            return Err(missing_image());
        }

        return Ok(UploadedImage {
            bytes: bytes.to_vec(),
            mime_type,
        });
    }

    Err(missing_image())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::multipart_body;
    use axum::{body::Body, extract::FromRequest, http::Request};

    async fn extract(content_type: &str, body: Vec<u8>) -> Result<UploadedImage, AppError> {
        let request = Request::builder()
            .method("POST")
            .header("content-type", content_type)
            .body(Body::from(body))
            .unwrap();
        read_uploaded_image(Multipart::from_request(request, &()).await).await
    }

    #[tokio::test]
    async fn test_reads_image_field() {
        let (content_type, body) = multipart_body(&[
            ("caption", None, b"hello".as_slice()),
            ("image", Some("image/jpeg"), b"jpeg-bytes".as_slice()),
        ]);
        let image = extract(&content_type, body).await.unwrap();
        assert_eq!(image.bytes, b"jpeg-bytes");
        assert_eq!(image.mime_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_non_image_content_type_falls_back_to_png() {
        let (content_type, body) =
            multipart_body(&[("image", Some("application/octet-stream"), b"raw".as_slice())]);
        let image = extract(&content_type, body).await.unwrap();
        assert_eq!(image.mime_type, "image/png");
    }

    #[tokio::test]
    async fn test_missing_field_is_validation_error() {
        let (content_type, body) = multipart_body(&[("photo", Some("image/png"), b"x".as_slice())]);
        let err = extract(&content_type, body).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.to_string(), "Missing 'image' file");
    }

    #[tokio::test]
    async fn test_text_field_named_image_is_not_an_upload() {
        let (content_type, body) = multipart_body(&[("image", None, b"not a file".as_slice())]);
        let err = extract(&content_type, body).await.unwrap_err();
        assert_eq!(err.to_string(), "Missing 'image' file");
    }

    #[tokio::test]
    async fn test_empty_image_is_validation_error() {
        let (content_type, body) = multipart_body(&[("image", Some("image/png"), b"".as_slice())]);
        let err = extract(&content_type, body).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_non_multipart_request_is_validation_error() {
        let err = extract("application/json", b"{}".to_vec()).await.unwrap_err();
        assert_eq!(err.to_string(), "Missing 'image' file");
    }
}
