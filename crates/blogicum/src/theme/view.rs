//! Template-facing shapes of domain rows.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{CommentWithAuthor, PostSummary};
use crate::policy::{Page, Viewer, is_owner};

/// A post as shown in listings and on its detail page.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: PostSummary,
    /// Location name, present only for published locations.
    pub location: Option<String>,
    /// Category link, present only for published categories.
    pub category_visible: bool,
    pub is_owner: bool,
    /// Shown to the owner: the post is not publicly visible yet.
    pub is_scheduled: bool,
}

impl PostView {
    pub fn new(post: PostSummary, viewer: &Viewer, now: DateTime<Utc>) -> Self {
        Self {
            location: post.visible_location().map(str::to_string),
            category_visible: post.category_published(),
            is_owner: is_owner(&post, viewer),
            is_scheduled: post.is_scheduled(now),
            post,
        }
    }

    pub fn page(page: Page<PostSummary>, viewer: &Viewer, now: DateTime<Utc>) -> Page<Self> {
        Page {
            items: page
                .items
                .into_iter()
                .map(|post| Self::new(post, viewer, now))
                .collect(),
            number: page.number,
            total_pages: page.total_pages,
            total: page.total,
            has_previous: page.has_previous,
            has_next: page.has_next,
            previous_page: page.previous_page,
            next_page: page.next_page,
        }
    }
}

/// A comment with its edit/delete affordances.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: CommentWithAuthor,
    pub is_owner: bool,
}

impl CommentView {
    pub fn list(comments: Vec<CommentWithAuthor>, viewer: &Viewer) -> Vec<Self> {
        comments
            .into_iter()
            .map(|comment| Self {
                is_owner: is_owner(&comment, viewer),
                comment,
            })
            .collect()
    }
}

/// The signed-in user, as the layout sees it.
#[derive(Debug, Clone, Serialize)]
pub struct ViewerView {
    pub id: Uuid,
    pub username: String,
}

impl ViewerView {
    pub fn from_viewer(viewer: &Viewer) -> Option<Self> {
        viewer.user().map(|user| Self {
            id: user.id,
            username: user.username.clone(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::User;
    use chrono::Duration;

    fn summary(author_id: Uuid, location_published: Option<bool>) -> PostSummary {
        let now = Utc::now();
        PostSummary {
            id: Uuid::now_v7(),
            title: "t".to_string(),
            text: "x".to_string(),
            image: None,
            pub_date: now + Duration::days(1),
            is_published: true,
            created_at: now,
            author_id,
            author_username: "alice".to_string(),
            category_id: None,
            category_title: None,
            category_slug: None,
            category_is_published: None,
            location_id: location_published.map(|_| Uuid::now_v7()),
            location_name: location_published.map(|_| "Paris".to_string()),
            location_is_published: location_published,
            comment_count: 2,
        }
    }

    #[test]
    fn hides_unpublished_location() {
        let viewer = Viewer::anonymous();
        let now = Utc::now();
        assert_eq!(
            PostView::new(summary(Uuid::now_v7(), Some(true)), &viewer, now).location,
            Some("Paris".to_string())
        );
        assert_eq!(
            PostView::new(summary(Uuid::now_v7(), Some(false)), &viewer, now).location,
            None
        );
    }

    #[test]
    fn flattens_post_fields() {
        let user = User {
            id: Uuid::now_v7(),
            username: "alice".to_string(),
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            pass: String::new(),
            date_joined: Utc::now(),
        };
        let viewer = Viewer::authenticated(user.clone());
        let view = PostView::new(summary(user.id, None), &viewer, Utc::now());
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["title"], "t");
        assert_eq!(json["comment_count"], 2);
        assert_eq!(json["is_owner"], true);
        assert_eq!(json["is_scheduled"], true);
        assert_eq!(json["category_visible"], false);
    }
}
