//! HTTP route handlers.

pub mod auth;
pub mod comment;
pub mod front;
pub mod health;
pub mod helpers;
pub mod post;
pub mod profile;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::state::AppState;

/// Room for the non-file fields of a post form on top of the image cap.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the full application router.
///
/// Layers, outermost first: TraceLayer → session → body limit → routes.
pub fn app<S>(state: AppState, session_layer: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    let body_limit = state.uploads().max_bytes() + FORM_OVERHEAD_BYTES;

    Router::new()
        .merge(front::router())
        .merge(post::router())
        .merge(comment::router())
        .merge(profile::router())
        .merge(auth::router())
        .merge(health::router())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
