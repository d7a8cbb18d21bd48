//! Category model: named, publishable groupings of posts.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Category record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    /// Human-readable title.
    pub title: String,

    /// Longer description shown on the category page.
    pub description: String,

    /// URL identifier (unique).
    pub slug: String,

    /// Unpublished categories hide their posts and their listing page.
    pub is_published: bool,

    /// When the category was created.
    pub created_at: DateTime<Utc>,
}

/// Input for creating a category.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategory {
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: bool,
}

impl Category {
    /// Build a new category record.
    pub fn from_input(input: CreateCategory) -> Self {
        Self {
            id: Uuid::now_v7(),
            title: input.title,
            description: input.description,
            slug: input.slug,
            is_published: input.is_published,
            created_at: Utc::now(),
        }
    }

    /// Find a category by slug.
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Self>> {
        let category = sqlx::query_as::<_, Category>("SELECT * FROM category WHERE slug = $1")
            .bind(slug)
            .fetch_optional(pool)
            .await
            .context("failed to fetch category by slug")?;

        Ok(category)
    }

    /// List all categories ordered by title.
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT * FROM category ORDER BY title, id")
                .fetch_all(pool)
                .await
                .context("failed to list categories")?;

        Ok(categories)
    }

    /// Insert a prepared category record.
    pub async fn insert(pool: &PgPool, category: &Category) -> Result<Self> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO category (id, title, description, slug, is_published, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(category.id)
        .bind(&category.title)
        .bind(&category.description)
        .bind(&category.slug)
        .bind(category.is_published)
        .bind(category.created_at)
        .fetch_one(pool)
        .await
        .context("failed to create category")?;

        Ok(category)
    }
}
