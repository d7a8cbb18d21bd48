//! Visibility and ownership rules.
//!
//! A post is publicly visible when its own flag is set, its category exists
//! and is published, and its publication time has passed. Authors always see
//! their own posts. Only authors may change or delete what they wrote.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Comment, CommentWithAuthor, Post, PostSummary, User};

/// The user a request is made on behalf of.
#[derive(Debug, Clone, Default)]
pub struct Viewer {
    user: Option<User>,
}

impl Viewer {
    /// An unauthenticated visitor.
    pub fn anonymous() -> Self {
        Self { user: None }
    }

    /// A logged-in user.
    pub fn authenticated(user: User) -> Self {
        Self { user: Some(user) }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn id(&self) -> Option<Uuid> {
        self.user.as_ref().map(|u| u.id)
    }

    pub fn username(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.username.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Anything with an author.
pub trait Authored {
    fn author_id(&self) -> Uuid;
}

impl Authored for Post {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

impl Authored for PostSummary {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

impl Authored for Comment {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

impl Authored for CommentWithAuthor {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

/// What a mutation endpoint does when the requester is not the author.
///
/// There is a single policy: the request is answered with a redirect to the
/// object's detail page and nothing is changed. No 403 is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipFailure {
    RedirectToDetail,
}

/// True when the viewer wrote the item.
pub fn is_owner<T: Authored + ?Sized>(item: &T, viewer: &Viewer) -> bool {
    viewer.id() == Some(item.author_id())
}

/// Gate for edit/delete endpoints.
pub fn check_owner<T: Authored + ?Sized>(
    item: &T,
    viewer: &Viewer,
) -> Result<(), OwnershipFailure> {
    if is_owner(item, viewer) {
        Ok(())
    } else {
        Err(OwnershipFailure::RedirectToDetail)
    }
}

/// The three publicity conditions, independent of who is looking.
pub fn is_publicly_visible(
    is_published: bool,
    category_published: bool,
    pub_date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> bool {
    is_published && category_published && pub_date <= now
}

/// Whether `viewer` may read `post` at time `now`.
pub fn is_visible(post: &PostSummary, viewer: &Viewer, now: DateTime<Utc>) -> bool {
    is_owner(post, viewer)
        || is_publicly_visible(
            post.is_published,
            post.category_published(),
            post.pub_date,
            now,
        )
}
