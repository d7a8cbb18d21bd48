//! Listing query assembly.
//!
//! A [`PostQuery`] describes which posts a page shows. It carries no SQL:
//! the Postgres store renders it with SeaQuery, the memory store evaluates
//! [`PostQuery::matches`] and sorts with [`compare_newest_first`]. Every
//! listing is ordered by publication time, newest first, with the post ID as
//! the tie-break.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::visibility::{Viewer, is_publicly_visible};
use crate::models::{Category, CommentWithAuthor, PostSummary, User};

/// Which visibility filter a query applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityFilter {
    /// Only publicly visible posts as of `now`.
    Public { now: DateTime<Utc> },
    /// No publication filter.
    Unrestricted,
}

/// What non-owners see on a profile page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProfileListingPolicy {
    /// Everyone sees the author's complete history, drafts and scheduled
    /// posts included.
    #[default]
    Full,
    /// Non-owners see only publicly visible posts.
    OwnerOnly,
}

impl FromStr for ProfileListingPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "owner" | "owner_only" => Ok(Self::OwnerOnly),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown profile listing policy: {0}")]
pub struct UnknownPolicy(String);

/// Backend-neutral description of a post listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    pub visibility: VisibilityFilter,
    pub category_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub post_id: Option<Uuid>,
}

impl PostQuery {
    /// Front page: every publicly visible post.
    pub fn index(now: DateTime<Utc>) -> Self {
        Self {
            visibility: VisibilityFilter::Public { now },
            category_id: None,
            author_id: None,
            post_id: None,
        }
    }

    /// Category page. `None` when the category itself is unpublished, which
    /// the caller reports as not found.
    pub fn category(category: &Category, now: DateTime<Utc>) -> Option<Self> {
        if !category.is_published {
            return None;
        }
        Some(Self {
            category_id: Some(category.id),
            ..Self::index(now)
        })
    }

    /// Profile page for `author` as seen by `viewer`.
    pub fn profile(
        author: &User,
        viewer: &Viewer,
        policy: ProfileListingPolicy,
        now: DateTime<Utc>,
    ) -> Self {
        let visibility = match policy {
            ProfileListingPolicy::Full => VisibilityFilter::Unrestricted,
            ProfileListingPolicy::OwnerOnly if viewer.id() == Some(author.id) => {
                VisibilityFilter::Unrestricted
            }
            ProfileListingPolicy::OwnerOnly => VisibilityFilter::Public { now },
        };
        Self {
            visibility,
            category_id: None,
            author_id: Some(author.id),
            post_id: None,
        }
    }

    /// A single post through the strict public filter.
    pub fn visible_post(id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            post_id: Some(id),
            ..Self::index(now)
        }
    }

    /// A single post, no filter.
    pub fn any_post(id: Uuid) -> Self {
        Self {
            visibility: VisibilityFilter::Unrestricted,
            category_id: None,
            author_id: None,
            post_id: Some(id),
        }
    }

    /// Evaluate the query against an already-joined row.
    pub fn matches(&self, post: &PostSummary) -> bool {
        if let VisibilityFilter::Public { now } = self.visibility
            && !is_publicly_visible(
                post.is_published,
                post.category_published(),
                post.pub_date,
                now,
            )
        {
            return false;
        }
        if self.category_id.is_some() && post.category_id != self.category_id {
            return false;
        }
        if let Some(author_id) = self.author_id
            && post.author_id != author_id
        {
            return false;
        }
        if let Some(post_id) = self.post_id
            && post.id != post_id
        {
            return false;
        }
        true
    }
}

/// Listing order: publication time descending, then ID descending.
pub fn compare_newest_first(a: &PostSummary, b: &PostSummary) -> Ordering {
    b.pub_date.cmp(&a.pub_date).then_with(|| b.id.cmp(&a.id))
}

/// Comment thread order: creation time ascending, then ID ascending.
pub fn compare_oldest_first(a: &CommentWithAuthor, b: &CommentWithAuthor) -> Ordering {
    a.created_at
        .cmp(&b.created_at)
        .then_with(|| a.id.cmp(&b.id))
}
