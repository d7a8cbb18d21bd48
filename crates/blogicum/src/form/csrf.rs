//! CSRF token generation and verification.
//!
//! Tokens live in the session as `token:timestamp` strings. A token is
//! accepted once, within [`TOKEN_VALIDITY_SECS`] of issue.

use anyhow::Result;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tower_sessions::Session;

/// Session key for storing CSRF tokens.
const CSRF_SESSION_KEY: &str = "csrf_tokens";

/// Maximum number of outstanding tokens per session.
const MAX_TOKENS: usize = 10;

/// Token validity period in seconds (1 hour).
pub const TOKEN_VALIDITY_SECS: i64 = 3600;

/// Name of the hidden form field carrying the token.
pub const CSRF_FIELD: &str = "csrf_token";

fn parse_entry(entry: &str) -> Option<(&str, i64)> {
    let (token, timestamp) = entry.split_once(':')?;
    Some((token, timestamp.parse().ok()?))
}

async fn load_tokens(session: &Session) -> Vec<String> {
    session
        .get(CSRF_SESSION_KEY)
        .await
        .unwrap_or(None)
        .unwrap_or_default()
}

/// Generate a CSRF token and store it in the session.
pub async fn generate_csrf_token(session: &Session) -> Result<String> {
    let mut random_bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut random_bytes);

    let timestamp = chrono::Utc::now().timestamp();

    let mut hasher = Sha256::new();
    hasher.update(random_bytes);
    hasher.update(timestamp.to_le_bytes());
    let token = hex::encode(hasher.finalize());

    let mut tokens = load_tokens(session).await;
    tokens.push(format!("{token}:{timestamp}"));

    // Keep only the most recent tokens.
    if tokens.len() > MAX_TOKENS {
        let skip = tokens.len() - MAX_TOKENS;
        tokens.drain(..skip);
    }

    session
        .insert(CSRF_SESSION_KEY, tokens)
        .await
        .map_err(|e| anyhow::anyhow!("failed to store CSRF token: {e}"))?;

    Ok(token)
}

/// Verify and consume a submitted token.
///
/// Returns `Ok(false)` for empty, unknown or expired tokens.
pub async fn verify_csrf_token(session: &Session, submitted: &str) -> Result<bool> {
    if submitted.is_empty() {
        return Ok(false);
    }

    let mut tokens = load_tokens(session).await;
    if tokens.is_empty() {
        return Ok(false);
    }

    let now = chrono::Utc::now().timestamp();
    let fresh = |timestamp: i64| now - timestamp <= TOKEN_VALIDITY_SECS;

    let found = tokens.iter().position(|entry| {
        parse_entry(entry).is_some_and(|(token, timestamp)| token == submitted && fresh(timestamp))
    });

    let Some(index) = found else {
        return Ok(false);
    };

    tokens.remove(index);
    tokens.retain(|entry| parse_entry(entry).is_some_and(|(_, timestamp)| fresh(timestamp)));

    session
        .insert(CSRF_SESSION_KEY, tokens)
        .await
        .map_err(|e| anyhow::anyhow!("failed to update CSRF tokens: {e}"))?;

    Ok(true)
}
