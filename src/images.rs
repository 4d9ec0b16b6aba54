//! Decoding of base64 data-URI images and storage below the media root.
//!
//! Stored keys look like `recipes/image/<uuid>.<ext>`; responses carry
//! them as `/media/<key>`.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use uuid::Uuid;

use crate::errors::RequestError;

#[derive(Debug, Clone)]
pub struct ImageData {
    pub ext: String,
    pub bytes: Vec<u8>,
}

/// Parses a `data:image/<ext>;base64,<payload>` string.
pub fn parse_data_uri(data: &str) -> Result<ImageData, &'static str> {
    let rest = data
        .strip_prefix("data:image/")
        .ok_or("expected a data:image/... URI")?;
    let (ext, payload) = rest
        .split_once(";base64,")
        .ok_or("expected a base64 data URI")?;
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err("unsupported image format");
    }
    if payload.is_empty() {
        return Err("image payload is empty");
    }
    let bytes = STANDARD
        .decode(payload)
        .map_err(|_| "invalid base64 image payload")?;
    Ok(ImageData {
        ext: ext.to_ascii_lowercase(),
        bytes,
    })
}

/// Writes the decoded image below the media root and returns its key.
pub async fn store_image(media_root: &Path, image: &ImageData) -> Result<String, RequestError> {
    let key = format!("recipes/image/{}.{}", Uuid::new_v4(), image.ext);
    let path = media_root.join(&key);
    let parent = path.parent().ok_or(RequestError::ServerError)?;
    tokio::fs::create_dir_all(parent).await.map_err(|e| {
        tracing::error!("failed to create media directory: {e}");
        RequestError::ServerError
    })?;
    tokio::fs::write(&path, &image.bytes).await.map_err(|e| {
        tracing::error!("failed to store image: {e}");
        RequestError::ServerError
    })?;
    Ok(key)
}

pub fn media_url(key: &str) -> String {
    format!("/media/{key}")
}
