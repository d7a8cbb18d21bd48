//! Authentication routes (registration, login, logout).

use anyhow::Context as _;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::AppResult;
use crate::form::account::safe_next;
use crate::form::{FormErrors, LoginForm, RegisterForm};
use crate::session::SESSION_USER_ID;
use crate::state::AppState;

use super::helpers::{RequestContext, render};

const INVALID_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

const USERNAME_TAKEN: &str = "A user with that username already exists.";

/// `?next=` on the login page.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

/// Create the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/auth/registration/",
            get(registration_form).post(registration_submit),
        )
        .route("/auth/login/", get(login_form).post(login_submit))
        .route("/auth/logout/", get(logout))
}

// =============================================================================
// Registration
// =============================================================================

async fn render_registration(
    state: &AppState,
    ctx: &RequestContext,
    form: &RegisterForm,
    errors: &FormErrors,
) -> AppResult<Response> {
    let mut context = ctx.template_context();
    context.insert("csrf_token", &ctx.csrf_token().await?);
    context.insert("form", form);
    context.insert("errors", errors);
    render(state, "registration/registration_form.html", &context)
}

/// GET /auth/registration/
async fn registration_form(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> AppResult<Response> {
    render_registration(&state, &ctx, &RegisterForm::default(), &FormErrors::new()).await
}

/// POST /auth/registration/
async fn registration_submit(
    State(state): State<AppState>,
    ctx: RequestContext,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    ctx.check_csrf(&form.csrf_token).await?;

    let (input, mut errors) = match form.validate() {
        Ok(input) => (Some(input), FormErrors::new()),
        Err(errors) => (None, errors),
    };

    if let Some(input) = &input
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
        _ => return render_registration(&state, &ctx, &form, &errors).await,
    };

    let user = state.store().create_user(input).await?;
    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(Redirect::to("/auth/login/").into_response())
}

// =============================================================================
// Login / logout
// =============================================================================

async fn render_login(
    state: &AppState,
    ctx: &RequestContext,
    form: &LoginForm,
    errors: &FormErrors,
) -> AppResult<Response> {
    let mut context = ctx.template_context();
    context.insert("csrf_token", &ctx.csrf_token().await?);
    context.insert("form", form);
    context.insert("errors", errors);
    render(state, "registration/login.html", &context)
}

/// GET /auth/login/
async fn login_form(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<LoginQuery>,
) -> AppResult<Response> {
    let form = LoginForm {
        next: query.next.unwrap_or_default(),
        ..LoginForm::default()
    };
    render_login(&state, &ctx, &form, &FormErrors::new()).await
}

/// POST /auth/login/
///
/// Unknown usernames and wrong passwords get the same message.
async fn login_submit(
    State(state): State<AppState>,
    ctx: RequestContext,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    ctx.check_csrf(&form.csrf_token).await?;

    let (username, password) = match form.validate() {
        Ok(credentials) => credentials,
        Err(errors) => return render_login(&state, &ctx, &form, &errors).await,
    };

    let user = state
        .store()
        .find_user_by_username(&username)
        .await?
        .filter(|user| user.verify_password(&password));

    let Some(user) = user else {
        warn!(username = %username, "failed login attempt");
        let mut errors = FormErrors::new();
        errors.add_non_field(INVALID_LOGIN);
        return render_login(&state, &ctx, &form, &errors).await;
    };

    ctx.session
        .cycle_id()
        .await
        .context("failed to cycle session id")?;
    ctx.session
        .insert(SESSION_USER_ID, user.id)
        .await
        .context("failed to store session user")?;

    info!(user_id = %user.id, username = %user.username, "user logged in");
    let target = safe_next(&form.next).unwrap_or("/");
    Ok(Redirect::to(target).into_response())
}

/// GET /auth/logout/
async fn logout(ctx: RequestContext) -> AppResult<Response> {
    if let Some(id) = ctx.viewer.id() {
        info!(user_id = %id, "user logged out");
    }
    ctx.session
        .flush()
        .await
        .context("failed to clear session")?;
    Ok(Redirect::to("/").into_response())
}
