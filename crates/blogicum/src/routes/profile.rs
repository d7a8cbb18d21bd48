//! User profile pages.

use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::get;
use axum::{Form, Router};
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::form::{FormErrors, ProfileForm};
use crate::models::User;
use crate::policy::PostQuery;
use crate::state::AppState;
use crate::store::paginate_posts;
use crate::theme::PostView;

use super::front::PageParams;
use super::helpers::{RequestContext, profile_redirect, render};

const USERNAME_TAKEN: &str = "A user with that username already exists.";

/// Create the profile router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile/{username}/", get(profile))
        .route("/profile/{username}/edit/", get(edit_form).post(edit_submit))
}

/// GET /profile/{username}/
async fn profile(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(username): Path<String>,
    params: PageParams,
) -> AppResult<Response> {
    let user = state
        .store()
        .find_user_by_username(&username)
        .await?
        .ok_or(AppError::NotFound)?;

    let query = PostQuery::profile(
        &user,
        &ctx.viewer,
        state.config().profile_listing_policy,
        ctx.now,
    );
    let page = paginate_posts(
        state.store(),
        &query,
        params.page.as_deref(),
        state.page_size(),
    )
    .await?;

    let mut context = ctx.template_context();
    context.insert("profile_name", &user.display_name());
    context.insert("is_own_profile", &(ctx.viewer.id() == Some(user.id)));
    context.insert("profile", &user);
    context.insert("page", &PostView::page(page, &ctx.viewer, ctx.now));
    render(&state, "blog/profile.html", &context)
}

async fn render_profile_form(
    state: &AppState,
    ctx: &RequestContext,
    username: &str,
    form: &ProfileForm,
    errors: &FormErrors,
) -> AppResult<Response> {
    let mut context = ctx.template_context();
    context.insert("csrf_token", &ctx.csrf_token().await?);
    context.insert("username", username);
    context.insert("form", form);
    context.insert("errors", errors);
    render(state, "blog/user.html", &context)
}

/// Resolve the profile being edited. Anyone but its owner is sent to the
/// profile page instead.
async fn load_own_profile(
    state: &AppState,
    ctx: &RequestContext,
    username: &str,
) -> AppResult<Result<User, Response>> {
    let user = state
        .store()
        .find_user_by_username(username)
        .await?
        .ok_or(AppError::NotFound)?;

    if ctx.viewer.id() != Some(user.id) {
        debug!(
            profile = %user.username,
            viewer = ?ctx.viewer.id(),
            "not the profile owner, redirecting"
        );
        return Ok(Err(profile_redirect(&user.username)));
    }
    Ok(Ok(user))
}

/// GET /profile/{username}/edit/
async fn edit_form(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(username): Path<String>,
) -> AppResult<Response> {
    if let Err(redirect) = ctx.require_login() {
        return Ok(redirect);
    }
    let user = match load_own_profile(&state, &ctx, &username).await? {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };

    render_profile_form(
        &state,
        &ctx,
        &user.username,
        &ProfileForm::from_user(&user),
        &FormErrors::new(),
    )
    .await
}

/// POST /profile/{username}/edit/
async fn edit_submit(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(username): Path<String>,
    Form(form): Form<ProfileForm>,
) -> AppResult<Response> {
    if let Err(redirect) = ctx.require_login() {
        return Ok(redirect);
    }
    let user = match load_own_profile(&state, &ctx, &username).await? {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };
    ctx.check_csrf(&form.csrf_token).await?;

    let (input, mut errors) = match form.validate() {
        Ok(input) => (Some(input), FormErrors::new()),
        Err(errors) => (None, errors),
    };

    if let Some(input) = &input
        && input.username != user.username
        && state
            .store()
            .find_user_by_username(&input.username)
            .await?
            .is_some()
    {
        errors.add("username", USERNAME_TAKEN);
    }

    let input = match input {
        Some(input) if errors.is_empty() => input,
        _ => return render_profile_form(&state, &ctx, &user.username, &form, &errors).await,
    };

    let updated = state
        .store()
        .update_profile(user.id, input)
        .await?
        .ok_or(AppError::NotFound)?;

    info!(user_id = %updated.id, username = %updated.username, "profile updated");
    Ok(profile_redirect(&updated.username))
}
