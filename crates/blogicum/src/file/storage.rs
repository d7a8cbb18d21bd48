//! File storage backends.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// File storage backend trait.
///
/// Keys are relative paths such as `posts/0190f5c2....png`.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Write data under the given key.
    async fn write(&self, key: &str, data: &[u8]) -> Result<()>;

    /// Read data stored under the given key.
    async fn read(&self, key: &str) -> Result<Vec<u8>>;

    /// Delete the file stored under the given key. Missing files are ignored.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Public URL for a key.
    fn public_url(&self, key: &str) -> String;

    /// Reverse of [`FileStorage::public_url`]. `None` for URLs this storage
    /// did not produce.
    fn key_for_url<'a>(&self, url: &'a str) -> Option<&'a str>;
}

/// Local filesystem storage.
pub struct LocalFileStorage {
    /// Base path for file storage.
    base_path: PathBuf,
    /// Base URL for public file access.
    base_url: String,
}

impl LocalFileStorage {
    pub fn new(base_path: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Resolve a key to a path under the base directory.
    ///
    /// Rejects absolute keys and `..` components.
    fn resolve(&self, key: &str) -> Result<PathBuf> {
        for component in Path::new(key).components() {
            if !matches!(component, Component::Normal(_)) {
                bail!("invalid storage key: {key}");
            }
        }
        Ok(self.base_path.join(key))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn write(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.resolve(key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("failed to create directories")?;
        }

        let mut file = fs::File::create(&path)
            .await
            .context("failed to create file")?;
        file.write_all(data).await.context("failed to write file")?;
        file.flush().await.context("failed to flush file")?;

        debug!(key = %key, path = ?path, size = data.len(), "file written");
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.resolve(key)?;
        let data = fs::read(&path).await.context("failed to read file")?;
        Ok(data)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.resolve(key)?;

        match fs::remove_file(&path).await {
            Ok(()) => debug!(key = %key, "file deleted"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(key = %key, "file not found for deletion");
            }
            Err(e) => return Err(e).context("failed to delete file"),
        }

        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    fn key_for_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(self.base_url.as_str())?.strip_prefix('/')
    }
}

impl std::fmt::Debug for LocalFileStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalFileStorage")
            .field("base_path", &self.base_path)
            .field("base_url", &self.base_url)
            .finish()
    }
}
