//! Comment model for discussions on posts.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Comment record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    /// Comment body.
    pub text: String,

    /// Parent post ID.
    pub post_id: Uuid,

    /// Author user ID.
    pub author_id: Uuid,

    /// When the comment was created.
    pub created_at: DateTime<Utc>,
}

/// Comment annotated with its author's username for display.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommentWithAuthor {
    pub id: Uuid,
    pub text: String,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub author_username: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a comment.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateComment {
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
}

impl Comment {
    /// Build a new comment record.
    pub fn from_input(input: CreateComment) -> Self {
        Self {
            id: Uuid::now_v7(),
            text: input.text,
            post_id: input.post_id,
            author_id: input.author_id,
            created_at: Utc::now(),
        }
    }

    /// Insert a prepared comment record.
    pub async fn insert(pool: &PgPool, comment: &Comment) -> Result<Self> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comment (id, text, post_id, author_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, text, post_id, author_id, created_at
            "#,
        )
        .bind(comment.id)
        .bind(&comment.text)
        .bind(comment.post_id)
        .bind(comment.author_id)
        .bind(comment.created_at)
        .fetch_one(pool)
        .await
        .context("failed to create comment")?;

        Ok(comment)
    }

    /// Find a comment by ID, scoped to its post.
    pub async fn find_for_post(pool: &PgPool, post_id: Uuid, id: Uuid) -> Result<Option<Self>> {
        let comment = sqlx::query_as::<_, Comment>(
            "SELECT id, text, post_id, author_id, created_at FROM comment WHERE id = $1 AND post_id = $2",
        )
        .bind(id)
        .bind(post_id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch comment")?;

        Ok(comment)
    }

    /// List comments for a post, oldest first, with author names.
    pub async fn list_for_post(pool: &PgPool, post_id: Uuid) -> Result<Vec<CommentWithAuthor>> {
        let comments = sqlx::query_as::<_, CommentWithAuthor>(
            r#"
            SELECT c.id, c.text, c.post_id, c.author_id, u.username AS author_username, c.created_at
            FROM comment c
            JOIN users u ON u.id = c.author_id
            WHERE c.post_id = $1
            ORDER BY c.created_at ASC, c.id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(pool)
        .await
        .context("failed to list comments for post")?;

        Ok(comments)
    }

    /// Replace a comment's text.
    pub async fn update_text(pool: &PgPool, id: Uuid, text: &str) -> Result<Option<Self>> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comment
            SET text = $1
            WHERE id = $2
            RETURNING id, text, post_id, author_id, created_at
            "#,
        )
        .bind(text)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to update comment")?;

        Ok(comment)
    }

    /// Delete a comment.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comment WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .context("failed to delete comment")?;

        Ok(result.rows_affected() > 0)
    }
}
