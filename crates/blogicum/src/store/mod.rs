//! Storage abstraction for blog data.
//!
//! All reads and writes go through [`BlogStore`]. Two implementations exist:
//!
//! - [`PgBlogStore`] executes SQL against PostgreSQL, rendering listing
//!   queries with SeaQuery (see [`sql`])
//! - [`MemoryBlogStore`] keeps everything in process memory; it backs the
//!   test suite and local runs without a database
//!
//! Both return listing rows as [`PostSummary`] values ordered newest first.
//!
//! # Usage
//!
//! ```ignore
//! let query = PostQuery::index(Utc::now());
//! let page = paginate_posts(store.as_ref(), &query, params.page.as_deref(), 10).await?;
//! ```

mod memory;
mod postgres;
pub mod sql;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

pub use memory::MemoryBlogStore;
pub use postgres::PgBlogStore;

use crate::models::{
    Category, Comment, CommentWithAuthor, CreateCategory, CreateComment, CreateLocation,
    CreatePost, CreateUser, Location, Post, PostSummary, UpdatePost, UpdateProfile, User,
};
use crate::policy::{Page, PageWindow, PostQuery};

/// Blog data access.
#[async_trait]
pub trait BlogStore: Send + Sync {
    // ---- users ----

    /// Create a user. The password in `input` is hashed before storage.
    async fn create_user(&self, input: CreateUser) -> Result<User>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Replace a user's profile fields. `None` when the user does not exist.
    async fn update_profile(&self, id: Uuid, input: UpdateProfile) -> Result<Option<User>>;

    // ---- categories ----

    async fn create_category(&self, input: CreateCategory) -> Result<Category>;

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>>;

    /// All categories, ordered by title.
    async fn list_categories(&self) -> Result<Vec<Category>>;

    // ---- locations ----

    async fn create_location(&self, input: CreateLocation) -> Result<Location>;

    /// All locations, ordered by name.
    async fn list_locations(&self) -> Result<Vec<Location>>;

    // ---- posts ----

    async fn create_post(&self, input: CreatePost) -> Result<Post>;

    /// A single post with its joins, regardless of visibility.
    async fn find_post(&self, id: Uuid) -> Result<Option<PostSummary>>;

    async fn update_post(&self, id: Uuid, input: UpdatePost) -> Result<Option<Post>>;

    /// Delete a post and every comment on it.
    async fn delete_post(&self, id: Uuid) -> Result<bool>;

    /// Number of posts `query` selects.
    async fn count_posts(&self, query: &PostQuery) -> Result<u64>;

    /// One slice of the posts `query` selects, newest first.
    async fn list_posts(&self, query: &PostQuery, offset: u64, limit: u64)
    -> Result<Vec<PostSummary>>;

    // ---- comments ----

    async fn create_comment(&self, input: CreateComment) -> Result<Comment>;

    /// A comment, only if it belongs to `post_id`.
    async fn find_comment(&self, post_id: Uuid, id: Uuid) -> Result<Option<Comment>>;

    async fn update_comment(&self, id: Uuid, text: &str) -> Result<Option<Comment>>;

    async fn delete_comment(&self, id: Uuid) -> Result<bool>;

    /// Comments on a post, oldest first.
    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>>;

    // ---- health ----

    /// Whether the backing storage answers.
    async fn ping(&self) -> bool;
}

/// Count, resolve the requested page, then fetch only that page.
pub async fn paginate_posts(
    store: &dyn BlogStore,
    query: &PostQuery,
    page_param: Option<&str>,
    per_page: u32,
) -> Result<Page<PostSummary>> {
    let total = store.count_posts(query).await?;
    let window = PageWindow::new(page_param, total, per_page);
    let items = store
        .list_posts(query, window.offset(), window.limit())
        .await?;

    Ok(Page::from_window(window, items))
}
