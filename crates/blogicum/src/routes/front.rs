//! Front page, category listings and static pages.

use std::convert::Infallible;

use axum::Router;
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::response::Response;
use axum::routing::get;

use crate::error::{AppError, AppResult};
use crate::policy::PostQuery;
use crate::state::AppState;
use crate::store::paginate_posts;
use crate::theme::PostView;

use super::helpers::{RequestContext, render};

/// `?page=` on listing pages. Kept as a string: garbage means page 1.
///
/// Never rejects. A repeated parameter takes its last value and an
/// unparseable query string counts as no page at all.
#[derive(Debug, Default)]
pub struct PageParams {
    pub page: Option<String>,
}

impl PageParams {
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let page = pairs
            .into_iter()
            .rev()
            .find(|(key, _)| key == "page")
            .map(|(_, value)| value);
        Self { page }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for PageParams {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let pairs = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
            .map(|Query(pairs)| pairs)
            .unwrap_or_default();
        Ok(Self::from_pairs(pairs))
    }
}

/// Create the front page router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/category/{slug}/", get(category_posts))
        .route("/pages/about/", get(about))
        .route("/pages/rules/", get(rules))
}

/// GET /
async fn index(
    State(state): State<AppState>,
    ctx: RequestContext,
    params: PageParams,
) -> AppResult<Response> {
    let query = PostQuery::index(ctx.now);
    let page = paginate_posts(
        state.store(),
        &query,
        params.page.as_deref(),
        state.page_size(),
    )
    .await?;

    let mut context = ctx.template_context();
    context.insert("page", &PostView::page(page, &ctx.viewer, ctx.now));
    render(&state, "blog/index.html", &context)
}

/// GET /category/{slug}/
///
/// Unknown and unpublished categories are both 404.
async fn category_posts(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(slug): Path<String>,
    params: PageParams,
) -> AppResult<Response> {
    let category = state
        .store()
        .find_category_by_slug(&slug)
        .await?
        .ok_or(AppError::NotFound)?;
    let query = PostQuery::category(&category, ctx.now).ok_or(AppError::NotFound)?;

    let page = paginate_posts(
        state.store(),
        &query,
        params.page.as_deref(),
        state.page_size(),
    )
    .await?;

    let mut context = ctx.template_context();
    context.insert("category", &category);
    context.insert("page", &PostView::page(page, &ctx.viewer, ctx.now));
    render(&state, "blog/category.html", &context)
}

/// GET /pages/about/
async fn about(State(state): State<AppState>, ctx: RequestContext) -> AppResult<Response> {
    render(&state, "pages/about.html", &ctx.template_context())
}

/// GET /pages/rules/
async fn rules(State(state): State<AppState>, ctx: RequestContext) -> AppResult<Response> {
    render(&state, "pages/rules.html", &ctx.template_context())
}
