//! Shared route helpers: request context, login gate, rendering.

use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{Html, IntoResponse, Redirect, Response};
use chrono::{DateTime, Utc};
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::form::{FormErrors, generate_csrf_token, verify_csrf_token};
use crate::models::User;
use crate::policy::Viewer;
use crate::session::SESSION_USER_ID;
use crate::state::AppState;
use crate::theme::ViewerView;

/// Per-request state every handler starts from.
///
/// The viewer is resolved from the session once per request; `now` is read
/// once so every visibility decision in a request uses the same instant.
pub struct RequestContext {
    pub viewer: Viewer,
    pub session: Session,
    pub now: DateTime<Utc>,
    /// Path and query of the request, for login redirects.
    pub path: String,
}

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::Internal(anyhow::anyhow!(msg)))?;

        let viewer = match session.get::<Uuid>(SESSION_USER_ID).await.ok().flatten() {
            Some(id) => match state.store().find_user_by_id(id).await? {
                Some(user) => Viewer::authenticated(user),
                None => Viewer::anonymous(),
            },
            None => Viewer::anonymous(),
        };

        let path = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());

        Ok(Self {
            viewer,
            session,
            now: Utc::now(),
            path,
        })
    }
}

impl RequestContext {
    /// The logged-in user, or a redirect to the login page that returns here.
    pub fn require_login(&self) -> Result<&User, Response> {
        self.viewer
            .user()
            .ok_or_else(|| login_redirect(&self.path))
    }

    /// Fresh CSRF token for a form on the page being rendered.
    pub async fn csrf_token(&self) -> AppResult<String> {
        Ok(generate_csrf_token(&self.session).await?)
    }

    /// Consume a submitted CSRF token. Invalid tokens are a 403.
    pub async fn check_csrf(&self, submitted: &str) -> AppResult<()> {
        if verify_csrf_token(&self.session, submitted).await? {
            Ok(())
        } else {
            tracing::warn!(path = %self.path, "CSRF token rejected");
            Err(AppError::Forbidden)
        }
    }

    /// Template context with the layout variables filled in.
    pub fn template_context(&self) -> tera::Context {
        let mut context = tera::Context::new();
        context.insert("viewer", &ViewerView::from_viewer(&self.viewer));
        context.insert("errors", &FormErrors::new());
        context
    }
}

/// Redirect to the login page, coming back to `next` afterwards.
pub fn login_redirect(next: &str) -> Response {
    let target = format!("/auth/login/?next={}", urlencoding::encode(next));
    Redirect::to(&target).into_response()
}

/// Redirect to a post's detail page.
pub fn post_redirect(post_id: Uuid) -> Response {
    Redirect::to(&format!("/posts/{post_id}/")).into_response()
}

/// Redirect to a profile page.
pub fn profile_redirect(username: &str) -> Response {
    Redirect::to(&format!("/profile/{}/", urlencoding::encode(username))).into_response()
}

/// Path identifiers that do not parse name nothing.
pub fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound)
}

/// Render a template as a 200 page.
pub fn render(state: &AppState, template: &str, context: &tera::Context) -> AppResult<Response> {
    let html = state.theme().render(template, context)?;
    Ok((StatusCode::OK, Html(html)).into_response())
}
