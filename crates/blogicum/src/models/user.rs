//! User model and CRUD operations.

use anyhow::{Context, Result};
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// User record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub pass: String,
    pub date_joined: DateTime<Utc>,
}

/// Input for creating a new user.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

/// Input for updating the editable profile fields.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProfile {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl User {
    /// Build a new user record, hashing the password.
    pub fn from_input(input: CreateUser) -> Result<Self> {
        Ok(Self {
            id: Uuid::now_v7(),
            pass: hash_password(&input.password)?,
            username: input.username,
            email: input.email,
            first_name: input.first_name,
            last_name: input.last_name,
            date_joined: Utc::now(),
        })
    }

    /// Name shown next to posts and comments.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }

    /// Apply profile changes in place.
    pub fn apply_profile(&mut self, input: UpdateProfile) {
        self.username = input.username;
        self.email = input.email;
        self.first_name = input.first_name;
        self.last_name = input.last_name;
    }

    /// Find a user by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch user by id")?;

        Ok(user)
    }

    /// Find a user by username.
    pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(pool)
            .await
            .context("failed to fetch user by username")?;

        Ok(user)
    }

    /// Insert a prepared user record.
    pub async fn insert(pool: &PgPool, user: &User) -> Result<Self> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, first_name, last_name, pass, date_joined)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.pass)
        .bind(user.date_joined)
        .fetch_one(pool)
        .await
        .context("failed to create user")?;

        Ok(user)
    }

    /// Update profile fields.
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        input: UpdateProfile,
    ) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET username = $1, email = $2, first_name = $3, last_name = $4
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(&input.username)
        .bind(&input.email)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to update user profile")?;

        Ok(user)
    }

    /// Verify a password against this user's hash.
    pub fn verify_password(&self, password: &str) -> bool {
        if self.pass.is_empty() {
            return false;
        }

        let Ok(parsed_hash) = PasswordHash::new(&self.pass) else {
            return false;
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

/// Hash a password using Argon2id.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;

    Ok(hash.to_string())
}
