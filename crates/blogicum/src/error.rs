//! Application error types.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;

/// Application errors.
///
/// Ownership failures are not errors: handlers answer them with a redirect
/// to the object's detail page (see [`crate::policy::OwnershipFailure`]).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("not found")]
    NotFound,

    #[error("CSRF verification failed")]
    Forbidden,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let (title, detail) = match &self {
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal server error");
                ("Server error", "Something went wrong on our side.".to_string())
            }
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                ("Server error", "Something went wrong on our side.".to_string())
            }
            AppError::NotFound => (
                "Page not found",
                "The page you requested does not exist.".to_string(),
            ),
            AppError::Forbidden => ("Forbidden", self.to_string()),
            AppError::BadRequest(_) => ("Bad request", self.to_string()),
        };

        (status, Html(error_page(status, title, &detail))).into_response()
    }
}

/// Standalone error page. Does not go through the template engine.
fn error_page(status: StatusCode, title: &str, detail: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html><head><title>{code} {title}</title></head>
<body><h1>{title}</h1><p>{detail}</p><p><a href="/">Back to the front page</a></p></body></html>"#,
        code = status.as_u16(),
        title = html_escape(title),
        detail = html_escape(detail),
    )
}

/// HTML-escape a string for safe output.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;
