//! Comment creation, editing and deletion.

use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::get;
use axum::{Form, Router};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::form::{CommentForm, FormErrors};
use crate::models::{Comment, CreateComment};
use crate::policy::check_owner;
use crate::state::AppState;

use super::helpers::{RequestContext, parse_id, post_redirect, render};
use super::post::{ConfirmForm, load_visible_post};

/// Create the comment router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts/{id}/comment/", get(add_form).post(add_submit))
        .route(
            "/posts/{post_id}/edit_comment/{comment_id}/",
            get(edit_form).post(edit_submit),
        )
        .route(
            "/posts/{post_id}/delete_comment/{comment_id}/",
            get(delete_confirm).post(delete_submit),
        )
}

/// What the comment template shows.
enum CommentPage<'a> {
    Add,
    Edit(&'a Comment),
    Delete(&'a Comment),
}

async fn render_comment_page(
    state: &AppState,
    ctx: &RequestContext,
    post_id: Uuid,
    page: CommentPage<'_>,
    form: &CommentForm,
    errors: &FormErrors,
) -> AppResult<Response> {
    let mut context = ctx.template_context();
    context.insert("csrf_token", &ctx.csrf_token().await?);
    context.insert("post_id", &post_id);
    context.insert("form", form);
    context.insert("errors", errors);

    let (comment, deleting, action) = match page {
        CommentPage::Add => (None, false, format!("/posts/{post_id}/comment/")),
        CommentPage::Edit(comment) => (
            Some(comment),
            false,
            format!("/posts/{post_id}/edit_comment/{}/", comment.id),
        ),
        CommentPage::Delete(comment) => (
            Some(comment),
            true,
            format!("/posts/{post_id}/delete_comment/{}/", comment.id),
        ),
    };
    context.insert("comment", &comment);
    context.insert("deleting", &deleting);
    context.insert("action", &action);
    render(state, "blog/comment.html", &context)
}

/// Resolve `(post_id, comment_id)` path segments to a comment the viewer
/// wrote. `Ok(Err(redirect))` when someone else wrote it.
async fn load_own_comment(
    state: &AppState,
    ctx: &RequestContext,
    post_id: &str,
    comment_id: &str,
) -> AppResult<(Uuid, Result<Comment, Response>)> {
    let post_id = parse_id(post_id)?;
    let comment_id = parse_id(comment_id)?;

    let comment = state
        .store()
        .find_comment(post_id, comment_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if check_owner(&comment, &ctx.viewer).is_err() {
        debug!(
            comment_id = %comment_id,
            viewer = ?ctx.viewer.id(),
            "not the comment author, redirecting"
        );
        return Ok((post_id, Err(post_redirect(post_id))));
    }
    Ok((post_id, Ok(comment)))
}

// =============================================================================
// Add
// =============================================================================

/// GET /posts/{id}/comment/
async fn add_form(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> AppResult<Response> {
    if let Err(redirect) = ctx.require_login() {
        return Ok(redirect);
    }
    let post = load_visible_post(&state, &ctx, parse_id(&id)?).await?;

    render_comment_page(
        &state,
        &ctx,
        post.id,
        CommentPage::Add,
        &CommentForm::default(),
        &FormErrors::new(),
    )
    .await
}

/// POST /posts/{id}/comment/
///
/// Only posts the viewer can read accept comments.
async fn add_submit(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Form(form): Form<CommentForm>,
) -> AppResult<Response> {
    let user = match ctx.require_login() {
        Ok(user) => user.clone(),
        Err(redirect) => return Ok(redirect),
    };
    let post = load_visible_post(&state, &ctx, parse_id(&id)?).await?;
    ctx.check_csrf(&form.csrf_token).await?;

    let text = match form.validate() {
        Ok(text) => text,
        Err(errors) => {
            return render_comment_page(&state, &ctx, post.id, CommentPage::Add, &form, &errors)
                .await;
        }
    };

    let comment = state
        .store()
        .create_comment(CreateComment {
            post_id: post.id,
            author_id: user.id,
            text,
        })
        .await?;

    info!(comment_id = %comment.id, post_id = %post.id, author = %user.username, "comment added");
    Ok(post_redirect(post.id))
}

// =============================================================================
// Edit
// =============================================================================

/// GET /posts/{post_id}/edit_comment/{comment_id}/
async fn edit_form(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((post_id, comment_id)): Path<(String, String)>,
) -> AppResult<Response> {
    if let Err(redirect) = ctx.require_login() {
        return Ok(redirect);
    }
    let (post_id, comment) = match load_own_comment(&state, &ctx, &post_id, &comment_id).await? {
        (post_id, Ok(comment)) => (post_id, comment),
        (_, Err(redirect)) => return Ok(redirect),
    };

    render_comment_page(
        &state,
        &ctx,
        post_id,
        CommentPage::Edit(&comment),
        &CommentForm::with_text(comment.text.clone()),
        &FormErrors::new(),
    )
    .await
}

/// POST /posts/{post_id}/edit_comment/{comment_id}/
async fn edit_submit(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((post_id, comment_id)): Path<(String, String)>,
    Form(form): Form<CommentForm>,
) -> AppResult<Response> {
    if let Err(redirect) = ctx.require_login() {
        return Ok(redirect);
    }
    let (post_id, comment) = match load_own_comment(&state, &ctx, &post_id, &comment_id).await? {
        (post_id, Ok(comment)) => (post_id, comment),
        (_, Err(redirect)) => return Ok(redirect),
    };
    ctx.check_csrf(&form.csrf_token).await?;

    let text = match form.validate() {
        Ok(text) => text,
        Err(errors) => {
            return render_comment_page(
                &state,
                &ctx,
                post_id,
                CommentPage::Edit(&comment),
                &form,
                &errors,
            )
            .await;
        }
    };

    state
        .store()
        .update_comment(comment.id, &text)
        .await?
        .ok_or(AppError::NotFound)?;

    info!(comment_id = %comment.id, post_id = %post_id, "comment updated");
    Ok(post_redirect(post_id))
}

// =============================================================================
// Delete
// =============================================================================

/// GET /posts/{post_id}/delete_comment/{comment_id}/
async fn delete_confirm(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((post_id, comment_id)): Path<(String, String)>,
) -> AppResult<Response> {
    if let Err(redirect) = ctx.require_login() {
        return Ok(redirect);
    }
    let (post_id, comment) = match load_own_comment(&state, &ctx, &post_id, &comment_id).await? {
        (post_id, Ok(comment)) => (post_id, comment),
        (_, Err(redirect)) => return Ok(redirect),
    };

    render_comment_page(
        &state,
        &ctx,
        post_id,
        CommentPage::Delete(&comment),
        &CommentForm::default(),
        &FormErrors::new(),
    )
    .await
}

/// POST /posts/{post_id}/delete_comment/{comment_id}/
async fn delete_submit(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((post_id, comment_id)): Path<(String, String)>,
    Form(form): Form<ConfirmForm>,
) -> AppResult<Response> {
    if let Err(redirect) = ctx.require_login() {
        return Ok(redirect);
    }
    let (post_id, comment) = match load_own_comment(&state, &ctx, &post_id, &comment_id).await? {
        (post_id, Ok(comment)) => (post_id, comment),
        (_, Err(redirect)) => return Ok(redirect),
    };
    ctx.check_csrf(&form.csrf_token).await?;

    if !state.store().delete_comment(comment.id).await? {
        return Err(AppError::NotFound);
    }

    info!(comment_id = %comment.id, post_id = %post_id, "comment deleted");
    Ok(post_redirect(post_id))
}
