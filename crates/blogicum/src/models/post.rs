//! Post model and CRUD operations.
//!
//! Listing queries (visibility filters, comment counts, pagination) are
//! assembled in [`crate::policy::query`] and executed by the store; this
//! module only handles single-row writes.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Post record as stored.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    /// Post title.
    pub title: String,

    /// Post body.
    pub text: String,

    /// Public URL of the attached image, if any.
    pub image: Option<String>,

    /// Publication time; posts dated in the future are scheduled.
    pub pub_date: DateTime<Utc>,

    /// Author-controlled publication flag.
    pub is_published: bool,

    /// Author user ID.
    pub author_id: Uuid,

    /// Category ID (NULL once the category is removed).
    pub category_id: Option<Uuid>,

    /// Optional location ID.
    pub location_id: Option<Uuid>,

    /// When the post was created.
    pub created_at: DateTime<Utc>,
}

/// A post joined with its author, category and location, plus the derived
/// comment count. This is the row shape of every listing and detail query.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostSummary {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub image: Option<String>,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub author_id: Uuid,
    pub author_username: String,
    pub category_id: Option<Uuid>,
    pub category_title: Option<String>,
    pub category_slug: Option<String>,
    pub category_is_published: Option<bool>,
    pub location_id: Option<Uuid>,
    pub location_name: Option<String>,
    pub location_is_published: Option<bool>,
    pub comment_count: i64,
}

/// Input for creating a post.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePost {
    pub title: String,
    pub text: String,
    pub image: Option<String>,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub author_id: Uuid,
    pub category_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
}

/// Input for updating a post.
///
/// `image`: `None` keeps the current image, `Some(None)` removes it,
/// `Some(Some(url))` replaces it. `location_id` follows the same scheme.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePost {
    pub title: Option<String>,
    pub text: Option<String>,
    pub image: Option<Option<String>>,
    pub pub_date: Option<DateTime<Utc>>,
    pub is_published: Option<bool>,
    pub category_id: Option<Uuid>,
    pub location_id: Option<Option<Uuid>>,
}

impl Post {
    /// Build a new post record.
    pub fn from_input(input: CreatePost) -> Self {
        Self {
            id: Uuid::now_v7(),
            title: input.title,
            text: input.text,
            image: input.image,
            pub_date: input.pub_date,
            is_published: input.is_published,
            author_id: input.author_id,
            category_id: input.category_id,
            location_id: input.location_id,
            created_at: Utc::now(),
        }
    }

    /// Apply an update in place.
    pub fn apply(&mut self, input: UpdatePost) {
        if let Some(title) = input.title {
            self.title = title;
        }
        if let Some(text) = input.text {
            self.text = text;
        }
        if let Some(image) = input.image {
            self.image = image;
        }
        if let Some(pub_date) = input.pub_date {
            self.pub_date = pub_date;
        }
        if let Some(is_published) = input.is_published {
            self.is_published = is_published;
        }
        if let Some(category_id) = input.category_id {
            self.category_id = Some(category_id);
        }
        if let Some(location_id) = input.location_id {
            self.location_id = location_id;
        }
    }

    /// Find a post by ID, regardless of visibility.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM post WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch post by id")?;

        Ok(post)
    }

    /// Insert a prepared post record.
    pub async fn insert(pool: &PgPool, post: &Post) -> Result<Self> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO post (id, title, text, image, pub_date, is_published, author_id, category_id, location_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(post.id)
        .bind(&post.title)
        .bind(&post.text)
        .bind(&post.image)
        .bind(post.pub_date)
        .bind(post.is_published)
        .bind(post.author_id)
        .bind(post.category_id)
        .bind(post.location_id)
        .bind(post.created_at)
        .fetch_one(pool)
        .await
        .context("failed to create post")?;

        Ok(post)
    }

    /// Update a post.
    pub async fn update(pool: &PgPool, id: Uuid, input: UpdatePost) -> Result<Option<Self>> {
        let Some(mut post) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        post.apply(input);

        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE post
            SET title = $1, text = $2, image = $3, pub_date = $4, is_published = $5,
                category_id = $6, location_id = $7
            WHERE id = $8
            RETURNING *
            "#,
        )
        .bind(&post.title)
        .bind(&post.text)
        .bind(&post.image)
        .bind(post.pub_date)
        .bind(post.is_published)
        .bind(post.category_id)
        .bind(post.location_id)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to update post")?;

        Ok(post)
    }

    /// Delete a post. Its comments go with it (ON DELETE CASCADE).
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM post WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .context("failed to delete post")?;

        Ok(result.rows_affected() > 0)
    }
}

impl PostSummary {
    /// Whether the post's category exists and is published.
    pub fn category_published(&self) -> bool {
        self.category_is_published.unwrap_or(false)
    }

    /// Location name, only when the location is published.
    pub fn visible_location(&self) -> Option<&str> {
        match self.location_is_published {
            Some(true) => self.location_name.as_deref(),
            _ => None,
        }
    }

    /// Whether the publication time lies after `now`.
    pub fn is_scheduled(&self, now: DateTime<Utc>) -> bool {
        self.pub_date > now
    }
}
