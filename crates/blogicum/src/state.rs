//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::db;
use crate::file::{ImageUploads, LocalFileStorage};
use crate::store::{BlogStore, MemoryBlogStore, PgBlogStore};
use crate::theme::ThemeEngine;

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// All blog data goes through this store.
    store: Arc<dyn BlogStore>,

    /// Template engine.
    theme: ThemeEngine,

    /// Post image storage.
    uploads: ImageUploads,

    config: Config,
}

impl AppState {
    /// Connect the configured store and build the state.
    ///
    /// With `DATABASE_URL` set this opens a pool and applies migrations;
    /// without it, data lives in memory for the life of the process.
    pub async fn new(config: &Config) -> Result<Self> {
        let store: Arc<dyn BlogStore> = match &config.database_url {
            Some(url) => {
                let pool = db::create_pool(url, config)
                    .await
                    .context("failed to create database pool")?;
                db::run_migrations(&pool).await?;
                info!("database migrations applied");
                Arc::new(PgBlogStore::new(pool))
            }
            None => {
                info!("DATABASE_URL not set, using in-memory store");
                Arc::new(MemoryBlogStore::new())
            }
        };

        Self::with_store(config, store)
    }

    /// Build state around an existing store.
    pub fn with_store(config: &Config, store: Arc<dyn BlogStore>) -> Result<Self> {
        let theme = ThemeEngine::new().context("failed to load templates")?;
        let storage = LocalFileStorage::new(&config.uploads_dir, config.media_url.clone());
        let uploads = ImageUploads::new(Arc::new(storage), config.max_upload_bytes);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                store,
                theme,
                uploads,
                config: config.clone(),
            }),
        })
    }

    pub fn store(&self) -> &dyn BlogStore {
        self.inner.store.as_ref()
    }

    pub fn theme(&self) -> &ThemeEngine {
        &self.inner.theme
    }

    pub fn uploads(&self) -> &ImageUploads {
        &self.inner.uploads
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Posts per listing page.
    pub fn page_size(&self) -> u32 {
        self.inner.config.posts_per_page
    }
}
