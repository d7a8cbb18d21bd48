//! Post image uploads.
//!
//! Uploaded bytes are sniffed with `infer`; only image types are accepted.
//! Files land under `posts/<uuid>.<ext>` in the configured storage and the
//! post keeps the resulting public URL.

pub mod storage;

use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

pub use storage::{FileStorage, LocalFileStorage};

/// Default upload size cap (5 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Why an upload was refused. Shown to the user as a field error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageRejection {
    #[error("The file is too large (maximum {max} bytes).")]
    TooLarge { max: usize },

    #[error("Upload a valid image. The file you uploaded was either not an image or a corrupted image.")]
    NotAnImage,
}

/// Check that `data` is an image within `max_bytes`. Returns the file
/// extension for its detected type.
pub fn validate_image(data: &[u8], max_bytes: usize) -> Result<&'static str, ImageRejection> {
    if data.len() > max_bytes {
        return Err(ImageRejection::TooLarge { max: max_bytes });
    }

    match infer::get(data) {
        Some(kind) if kind.matcher_type() == infer::MatcherType::Image => Ok(kind.extension()),
        _ => Err(ImageRejection::NotAnImage),
    }
}

/// Stores and removes post images.
#[derive(Clone)]
pub struct ImageUploads {
    storage: Arc<dyn FileStorage>,
    max_bytes: usize,
}

impl ImageUploads {
    pub fn new(storage: Arc<dyn FileStorage>, max_bytes: usize) -> Self {
        Self { storage, max_bytes }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn storage(&self) -> &Arc<dyn FileStorage> {
        &self.storage
    }

    /// Store a validated image and return its public URL.
    pub async fn store(&self, data: &[u8], extension: &str) -> Result<String> {
        let key = format!("posts/{}.{extension}", Uuid::now_v7());
        self.storage.write(&key, data).await?;
        info!(key = %key, size = data.len(), "post image stored");
        Ok(self.storage.public_url(&key))
    }

    /// Remove a previously stored image. URLs from elsewhere are left alone.
    pub async fn remove(&self, url: &str) -> Result<()> {
        if let Some(key) = self.storage.key_for_url(url) {
            self.storage.delete(key).await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for ImageUploads {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUploads")
            .field("max_bytes", &self.max_bytes)
            .finish()
    }
}
