//! Location model.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A named place a post can be attached to.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    /// Unpublished locations are not shown on posts.
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a location.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLocation {
    pub name: String,
    pub is_published: bool,
}

impl Location {
    pub fn from_input(input: CreateLocation) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: input.name,
            is_published: input.is_published,
            created_at: Utc::now(),
        }
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Self>> {
        let locations = sqlx::query_as::<_, Location>("SELECT * FROM location ORDER BY name, id")
            .fetch_all(pool)
            .await
            .context("failed to list locations")?;

        Ok(locations)
    }

    pub async fn insert(pool: &PgPool, location: &Location) -> Result<Self> {
        let location = sqlx::query_as::<_, Location>(
            r#"
            INSERT INTO location (id, name, is_published, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(location.id)
        .bind(&location.name)
        .bind(location.is_published)
        .bind(location.created_at)
        .fetch_one(pool)
        .await
        .context("failed to create location")?;

        Ok(location)
    }
}
