//! PostgreSQL implementation of BlogStore.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::BlogStore;
use super::sql::PostQueryBuilder;
use crate::db;
use crate::models::{
    Category, Comment, CommentWithAuthor, CreateCategory, CreateComment, CreateLocation,
    CreatePost, CreateUser, Location, Post, PostSummary, UpdatePost, UpdateProfile, User,
};
use crate::policy::PostQuery;

/// Executes model queries against a connection pool.
#[derive(Clone)]
pub struct PgBlogStore {
    pool: PgPool,
}

impl PgBlogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BlogStore for PgBlogStore {
    async fn create_user(&self, input: CreateUser) -> Result<User> {
        let user = User::from_input(input)?;
        User::insert(&self.pool, &user).await
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        User::find_by_id(&self.pool, id).await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        User::find_by_username(&self.pool, username).await
    }

    async fn update_profile(&self, id: Uuid, input: UpdateProfile) -> Result<Option<User>> {
        User::update_profile(&self.pool, id, input).await
    }

    async fn create_category(&self, input: CreateCategory) -> Result<Category> {
        Category::insert(&self.pool, &Category::from_input(input)).await
    }

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        Category::find_by_slug(&self.pool, slug).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        Category::list(&self.pool).await
    }

    async fn create_location(&self, input: CreateLocation) -> Result<Location> {
        Location::insert(&self.pool, &Location::from_input(input)).await
    }

    async fn list_locations(&self) -> Result<Vec<Location>> {
        Location::list(&self.pool).await
    }

    async fn create_post(&self, input: CreatePost) -> Result<Post> {
        Post::insert(&self.pool, &Post::from_input(input)).await
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<PostSummary>> {
        let mut rows = self.list_posts(&PostQuery::any_post(id), 0, 1).await?;
        Ok(rows.pop())
    }

    async fn update_post(&self, id: Uuid, input: UpdatePost) -> Result<Option<Post>> {
        Post::update(&self.pool, id, input).await
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool> {
        Post::delete(&self.pool, id).await
    }

    async fn count_posts(&self, query: &PostQuery) -> Result<u64> {
        let sql = PostQueryBuilder::new(query).build_count();
        let count: i64 = sqlx::query_scalar(&sql)
            .fetch_one(&self.pool)
            .await
            .context("failed to count posts")?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn list_posts(
        &self,
        query: &PostQuery,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<PostSummary>> {
        let sql = PostQueryBuilder::new(query).build(offset, limit);
        let posts = sqlx::query_as::<_, PostSummary>(&sql)
            .fetch_all(&self.pool)
            .await
            .context("failed to list posts")?;

        Ok(posts)
    }

    async fn create_comment(&self, input: CreateComment) -> Result<Comment> {
        Comment::insert(&self.pool, &Comment::from_input(input)).await
    }

    async fn find_comment(&self, post_id: Uuid, id: Uuid) -> Result<Option<Comment>> {
        Comment::find_for_post(&self.pool, post_id, id).await
    }

    async fn update_comment(&self, id: Uuid, text: &str) -> Result<Option<Comment>> {
        Comment::update_text(&self.pool, id, text).await
    }

    async fn delete_comment(&self, id: Uuid) -> Result<bool> {
        Comment::delete(&self.pool, id).await
    }

    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>> {
        Comment::list_for_post(&self.pool, post_id).await
    }

    async fn ping(&self) -> bool {
        db::check_health(&self.pool).await
    }
}
