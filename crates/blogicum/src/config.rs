//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use crate::policy::ProfileListingPolicy;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 8000).
    pub port: u16,

    /// PostgreSQL connection URL. When None, the in-memory store is used.
    pub database_url: Option<String>,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Redis connection URL for sessions.
    pub redis_url: String,

    /// Number of posts on one listing page (default: 10).
    pub posts_per_page: u32,

    /// What non-owners see on a profile page (default: full history).
    pub profile_listing_policy: ProfileListingPolicy,

    /// Path to uploads directory (default: ./media).
    pub uploads_dir: PathBuf,

    /// Base URL stored for uploaded images (default: /media).
    pub media_url: String,

    /// Largest accepted image upload in bytes (default: 5 MiB).
    pub max_upload_bytes: usize,

    /// Cookie SameSite policy: "strict", "lax", or "none" (default: "lax").
    pub cookie_same_site: String,

    /// Whether the session cookie carries the Secure attribute (default: true).
    pub cookie_secure: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let posts_per_page: u32 = env::var("POSTS_PER_PAGE")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("POSTS_PER_PAGE must be a valid u32")?;
        if posts_per_page == 0 {
            bail!("POSTS_PER_PAGE must be at least 1");
        }

        let profile_listing_policy = env::var("PROFILE_LISTING_POLICY")
            .unwrap_or_else(|_| "full".to_string())
            .parse()
            .context("PROFILE_LISTING_POLICY must be \"full\" or \"owner\"")?;

        let uploads_dir = env::var("UPLOADS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./media"));

        let media_url = env::var("MEDIA_URL")
            .unwrap_or_else(|_| "/media".to_string())
            .trim_end_matches('/')
            .to_string();

        let max_upload_bytes = env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| (5 * 1024 * 1024).to_string())
            .parse()
            .context("MAX_UPLOAD_BYTES must be a valid usize")?;

        let cookie_same_site = env::var("COOKIE_SAME_SITE")
            .unwrap_or_else(|_| "lax".to_string())
            .to_lowercase();

        let cookie_secure = env::var("COOKIE_SECURE")
            .map(|v| !matches!(v.to_lowercase().as_str(), "0" | "false" | "no" | "off"))
            .unwrap_or(true);

        Ok(Self {
            port,
            database_url,
            database_max_connections,
            redis_url,
            posts_per_page,
            profile_listing_policy,
            uploads_dir,
            media_url,
            max_upload_bytes,
            cookie_same_site,
            cookie_secure,
        })
    }

    /// Configuration suitable for tests and local experiments: in-memory
    /// store, insecure cookies, uploads under the system temp directory.
    pub fn for_memory_store() -> Self {
        Self {
            port: 8000,
            database_url: None,
            database_max_connections: 1,
            redis_url: String::new(),
            posts_per_page: 10,
            profile_listing_policy: ProfileListingPolicy::Full,
            uploads_dir: env::temp_dir().join("blogicum-media"),
            media_url: "/media".to_string(),
            max_upload_bytes: 5 * 1024 * 1024,
            cookie_same_site: "lax".to_string(),
            cookie_secure: false,
        }
    }
}
