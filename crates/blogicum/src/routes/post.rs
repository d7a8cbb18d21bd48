//! Post detail, creation, editing and deletion.

use axum::extract::{Multipart, Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::form::{CommentForm, FormErrors, PostForm, PostInput, PostSubmission};
use crate::models::{CreatePost, PostSummary, UpdatePost};
use crate::policy::{PostQuery, check_owner, is_owner, is_visible};
use crate::state::AppState;
use crate::theme::{CommentView, PostView};

use super::helpers::{RequestContext, parse_id, post_redirect, profile_redirect, render};

/// Body of forms that carry nothing but a CSRF token.
#[derive(Debug, Default, Deserialize)]
pub struct ConfirmForm {
    #[serde(default)]
    pub csrf_token: String,
}

/// Create the post router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts/create/", get(create_form).post(create_submit))
        .route("/posts/{id}/", get(post_detail))
        .route("/posts/{id}/edit/", get(edit_form).post(edit_submit))
        .route("/posts/{id}/delete/", get(delete_confirm).post(delete_submit))
}

// =============================================================================
// Detail
// =============================================================================

/// GET /posts/{id}/
async fn post_detail(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let id = parse_id(&id)?;
    let post = load_visible_post(&state, &ctx, id).await?;

    let comments = state.store().list_comments(id).await?;

    let mut context = ctx.template_context();
    if ctx.viewer.is_authenticated() {
        context.insert("csrf_token", &ctx.csrf_token().await?);
    }
    context.insert("form", &CommentForm::default());
    context.insert("comments", &CommentView::list(comments, &ctx.viewer));
    context.insert("post", &PostView::new(post, &ctx.viewer, ctx.now));
    render(&state, "blog/detail.html", &context)
}

/// A post as the viewer may see it: authors always get their own posts,
/// everyone else only through the public visibility filter.
pub(super) async fn load_visible_post(
    state: &AppState,
    ctx: &RequestContext,
    id: Uuid,
) -> AppResult<PostSummary> {
    let post = state
        .store()
        .find_post(id)
        .await?
        .ok_or(AppError::NotFound)?;
    if !is_visible(&post, &ctx.viewer, ctx.now) {
        debug!(post_id = %id, "post hidden from viewer");
        return Err(AppError::NotFound);
    }
    if is_owner(&post, &ctx.viewer) {
        return Ok(post);
    }

    state
        .store()
        .list_posts(&PostQuery::visible_post(id, ctx.now), 0, 1)
        .await?
        .pop()
        .ok_or(AppError::NotFound)
}

// =============================================================================
// Create / edit
// =============================================================================

/// Render the post form, fresh or with errors.
async fn render_post_form(
    state: &AppState,
    ctx: &RequestContext,
    form: &PostForm,
    errors: &FormErrors,
    editing: Option<&PostSummary>,
) -> AppResult<Response> {
    let categories = state.store().list_categories().await?;
    let locations = state.store().list_locations().await?;

    let mut context = ctx.template_context();
    context.insert("csrf_token", &ctx.csrf_token().await?);
    context.insert("form", form);
    context.insert("errors", errors);
    context.insert("categories", &categories);
    context.insert("locations", &locations);
    context.insert("editing", &editing.is_some());
    match editing {
        Some(post) => {
            context.insert("action", &format!("/posts/{}/edit/", post.id));
            context.insert("current_image", &post.image);
        }
        None => {
            context.insert("action", "/posts/create/");
            context.insert("current_image", &None::<String>);
        }
    }
    render(state, "blog/create.html", &context)
}

/// Read and validate a submitted post form. `Err(response)` is the form
/// re-rendered with errors.
async fn validate_submission(
    state: &AppState,
    ctx: &RequestContext,
    submission: &PostSubmission,
    editing: Option<&PostSummary>,
) -> AppResult<Result<PostInput, Response>> {
    let categories = state.store().list_categories().await?;
    let locations = state.store().list_locations().await?;

    match submission.form.validate(
        submission.image.as_ref(),
        &categories,
        &locations,
        state.uploads().max_bytes(),
    ) {
        Ok(input) => Ok(Ok(input)),
        Err(errors) => {
            debug!(fields = ?errors, "post form rejected");
            let response = render_post_form(state, ctx, &submission.form, &errors, editing).await?;
            Ok(Err(response))
        }
    }
}

/// Store an uploaded image, if the form carried one.
async fn store_image(state: &AppState, input: &PostInput) -> AppResult<Option<String>> {
    match &input.image {
        Some(image) => Ok(Some(
            state
                .uploads()
                .store(&image.data, image.extension)
                .await?,
        )),
        None => Ok(None),
    }
}

/// Best-effort removal of a replaced image.
async fn discard_image(state: &AppState, url: Option<&str>) {
    if let Some(url) = url
        && let Err(e) = state.uploads().remove(url).await
    {
        warn!(error = %e, url = %url, "failed to remove post image");
    }
}

/// GET /posts/create/
async fn create_form(State(state): State<AppState>, ctx: RequestContext) -> AppResult<Response> {
    if let Err(redirect) = ctx.require_login() {
        return Ok(redirect);
    }
    render_post_form(&state, &ctx, &PostForm::blank(ctx.now), &FormErrors::new(), None).await
}

/// POST /posts/create/
async fn create_submit(
    State(state): State<AppState>,
    ctx: RequestContext,
    multipart: Multipart,
) -> AppResult<Response> {
    let user = match ctx.require_login() {
        Ok(user) => user.clone(),
        Err(redirect) => return Ok(redirect),
    };

    let submission = PostSubmission::from_multipart(multipart).await?;
    ctx.check_csrf(&submission.csrf_token).await?;

    let input = match validate_submission(&state, &ctx, &submission, None).await? {
        Ok(input) => input,
        Err(response) => return Ok(response),
    };

    let image = store_image(&state, &input).await?;
    let post = state
        .store()
        .create_post(CreatePost {
            title: input.title,
            text: input.text,
            image,
            pub_date: input.pub_date,
            is_published: input.is_published,
            author_id: user.id,
            category_id: Some(input.category_id),
            location_id: input.location_id,
        })
        .await?;

    info!(post_id = %post.id, author = %user.username, "post created");
    Ok(profile_redirect(&user.username))
}

/// Load a post for an owner-only endpoint.
///
/// `Ok(Err(redirect))` when the viewer is not the author.
async fn load_owned_post(
    state: &AppState,
    ctx: &RequestContext,
    id: Uuid,
) -> AppResult<Result<PostSummary, Response>> {
    let post = state
        .store()
        .find_post(id)
        .await?
        .ok_or(AppError::NotFound)?;

    if check_owner(&post, &ctx.viewer).is_err() {
        debug!(post_id = %id, viewer = ?ctx.viewer.id(), "not the author, redirecting");
        return Ok(Err(post_redirect(id)));
    }
    Ok(Ok(post))
}

/// GET /posts/{id}/edit/
async fn edit_form(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> AppResult<Response> {
    if let Err(redirect) = ctx.require_login() {
        return Ok(redirect);
    }
    let id = parse_id(&id)?;
    let post = match load_owned_post(&state, &ctx, id).await? {
        Ok(post) => post,
        Err(redirect) => return Ok(redirect),
    };

    render_post_form(
        &state,
        &ctx,
        &PostForm::from_post(&post),
        &FormErrors::new(),
        Some(&post),
    )
    .await
}

/// POST /posts/{id}/edit/
async fn edit_submit(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    multipart: Multipart,
) -> AppResult<Response> {
    if let Err(redirect) = ctx.require_login() {
        return Ok(redirect);
    }
    let id = parse_id(&id)?;
    let post = match load_owned_post(&state, &ctx, id).await? {
        Ok(post) => post,
        Err(redirect) => return Ok(redirect),
    };

    let submission = PostSubmission::from_multipart(multipart).await?;
    ctx.check_csrf(&submission.csrf_token).await?;

    let input = match validate_submission(&state, &ctx, &submission, Some(&post)).await? {
        Ok(input) => input,
        Err(response) => return Ok(response),
    };

    let image = match store_image(&state, &input).await? {
        Some(url) => Some(Some(url)),
        None if input.clear_image => Some(None),
        None => None,
    };
    if image.is_some() {
        discard_image(&state, post.image.as_deref()).await;
    }

    state
        .store()
        .update_post(
            id,
            UpdatePost {
                title: Some(input.title),
                text: Some(input.text),
                image,
                pub_date: Some(input.pub_date),
                is_published: Some(input.is_published),
                category_id: Some(input.category_id),
                location_id: Some(input.location_id),
            },
        )
        .await?
        .ok_or(AppError::NotFound)?;

    info!(post_id = %id, "post updated");
    Ok(post_redirect(id))
}

// =============================================================================
// Delete
// =============================================================================

/// GET /posts/{id}/delete/
async fn delete_confirm(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> AppResult<Response> {
    if let Err(redirect) = ctx.require_login() {
        return Ok(redirect);
    }
    let id = parse_id(&id)?;
    let post = match load_owned_post(&state, &ctx, id).await? {
        Ok(post) => post,
        Err(redirect) => return Ok(redirect),
    };

    let mut context = ctx.template_context();
    context.insert("csrf_token", &ctx.csrf_token().await?);
    context.insert("post", &post);
    render(&state, "blog/post_delete.html", &context)
}

/// POST /posts/{id}/delete/
async fn delete_submit(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Form(form): Form<ConfirmForm>,
) -> AppResult<Response> {
    if let Err(redirect) = ctx.require_login() {
        return Ok(redirect);
    }
    let id = parse_id(&id)?;
    let post = match load_owned_post(&state, &ctx, id).await? {
        Ok(post) => post,
        Err(redirect) => return Ok(redirect),
    };
    ctx.check_csrf(&form.csrf_token).await?;

    if !state.store().delete_post(id).await? {
        return Err(AppError::NotFound);
    }
    discard_image(&state, post.image.as_deref()).await;

    info!(post_id = %id, "post deleted");
    Ok(Redirect::to("/").into_response())
}
