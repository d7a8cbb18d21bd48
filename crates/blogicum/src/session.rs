//! Session management using Redis.

use anyhow::{Context, Result};
use fred::prelude::*;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_redis_store::RedisStore;

use crate::config::Config as AppConfig;

/// Session key for the authenticated user ID.
pub const SESSION_USER_ID: &str = "user_id";

/// Default session expiry (2 weeks of inactivity).
pub const DEFAULT_SESSION_EXPIRY_DAYS: i64 = 14;

/// Parse the configured SameSite policy.
pub fn same_site(value: &str) -> SameSite {
    match value {
        "strict" => SameSite::Strict,
        "none" => SameSite::None,
        _ => SameSite::Lax,
    }
}

/// Apply the cookie policy shared by every session backend.
pub fn configure_layer<S: SessionStore>(store: S, config: &AppConfig) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_secure(config.cookie_secure)
        .with_http_only(true)
        .with_same_site(same_site(&config.cookie_same_site))
        .with_expiry(Expiry::OnInactivity(Duration::days(
            DEFAULT_SESSION_EXPIRY_DAYS,
        )))
}

/// Create the session layer using Redis as the backend.
pub async fn create_session_layer(
    config: &AppConfig,
) -> Result<SessionManagerLayer<RedisStore<Pool>>> {
    let redis_config = Config::from_url(&config.redis_url).context("failed to parse Redis URL")?;

    let pool = Builder::from_config(redis_config)
        .build_pool(1)
        .context("failed to create Redis pool")?;

    pool.init()
        .await
        .context("failed to connect to Redis for sessions")?;

    Ok(configure_layer(RedisStore::new(pool), config))
}
