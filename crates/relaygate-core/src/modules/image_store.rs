//! Local filesystem image store served back through `GET /images/:name`.

use async_trait::async_trait;
use base64::Engine;
use relaygate_types::CollaboratorError;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::proxy::collaborators::ImageStore;

fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        _ => "bin",
    }
}

/// Content type for a stored file name, the inverse of the extension table.
pub fn mime_for_file(name: &str) -> &'static str {
    match name.rsplit('.').next() {
        Some("png") => "image/png",
        Some("jpg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Stored file names are `<hex>.<ext>`; anything else is rejected so
/// lookups cannot escape the image directory.
pub fn is_valid_image_name(name: &str) -> bool {
    let Some((stem, ext)) = name.split_once('.') else {
        return false;
    };
    !stem.is_empty()
        && stem.chars().all(|c| c.is_ascii_hexdigit())
        && !ext.is_empty()
        && ext.chars().all(|c| c.is_ascii_alphanumeric())
}

pub struct LocalImageStore {
    dir: PathBuf,
    public_base_url: String,
}

impl LocalImageStore {
    pub fn new(dir: PathBuf, public_base_url: impl Into<String>) -> Self {
        Self { dir, public_base_url: public_base_url.into().trim_end_matches('/').to_string() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read a stored image by file name.
    pub async fn load(&self, name: &str) -> Option<Vec<u8>> {
        if !is_valid_image_name(name) {
            return None;
        }
        tokio::fs::read(self.dir.join(name)).await.ok()
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn store(&self, data_base64: &str, mime_type: &str) -> Result<String, CollaboratorError> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(data_base64.trim())
            .map_err(|e| CollaboratorError::Serialization {
                message: format!("invalid base64 image: {}", e),
            })?;

        let digest = Sha256::digest(&bytes);
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        let file_name = format!("{}.{}", hex, extension_for(mime_type));

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(&file_name);
        if tokio::fs::metadata(&path).await.is_err() {
            tokio::fs::write(&path, &bytes).await?;
            tracing::debug!("[ImageStore] Stored {} ({} bytes)", file_name, bytes.len());
        }

        Ok(format!("{}/images/{}", self.public_base_url, file_name))
    }
}
