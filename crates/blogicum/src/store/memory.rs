//! In-process implementation of BlogStore.
//!
//! Joins, comment counts, filters and ordering are evaluated in Rust with
//! the same rules the SQL builder renders, so handlers behave identically on
//! both backends. Uniqueness of usernames and category slugs is enforced here
//! the way the database constraints enforce it.

use std::collections::HashMap;

use anyhow::{Result, bail};
use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use super::BlogStore;
use crate::models::{
    Category, Comment, CommentWithAuthor, CreateCategory, CreateComment, CreateLocation,
    CreatePost, CreateUser, Location, Post, PostSummary, UpdatePost, UpdateProfile, User,
};
use crate::policy::PostQuery;
use crate::policy::query::{compare_newest_first, compare_oldest_first};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    categories: HashMap<Uuid, Category>,
    locations: HashMap<Uuid, Location>,
    posts: HashMap<Uuid, Post>,
    comments: HashMap<Uuid, Comment>,
}

impl Tables {
    fn username_taken(&self, username: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|u| u.username == username && Some(u.id) != except)
    }

    /// Join a post the way the listing query does. `None` when the author is
    /// missing (inner join).
    fn summarize(&self, post: &Post) -> Option<PostSummary> {
        let author = self.users.get(&post.author_id)?;
        let category = post.category_id.and_then(|id| self.categories.get(&id));
        let location = post.location_id.and_then(|id| self.locations.get(&id));
        let comment_count = self.comments.values().filter(|c| c.post_id == post.id).count();

        Some(PostSummary {
            id: post.id,
            title: post.title.clone(),
            text: post.text.clone(),
            image: post.image.clone(),
            pub_date: post.pub_date,
            is_published: post.is_published,
            created_at: post.created_at,
            author_id: author.id,
            author_username: author.username.clone(),
            category_id: category.map(|c| c.id),
            category_title: category.map(|c| c.title.clone()),
            category_slug: category.map(|c| c.slug.clone()),
            category_is_published: category.map(|c| c.is_published),
            location_id: location.map(|l| l.id),
            location_name: location.map(|l| l.name.clone()),
            location_is_published: location.map(|l| l.is_published),
            comment_count: i64::try_from(comment_count).unwrap_or(i64::MAX),
        })
    }

    fn select(&self, query: &PostQuery) -> Vec<PostSummary> {
        let mut rows: Vec<PostSummary> = self
            .posts
            .values()
            .filter_map(|post| self.summarize(post))
            .filter(|row| query.matches(row))
            .collect();
        rows.sort_by(compare_newest_first);
        rows
    }
}

/// Blog data held behind a read-write lock.
#[derive(Default)]
pub struct MemoryBlogStore {
    tables: RwLock<Tables>,
}

impl MemoryBlogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlogStore for MemoryBlogStore {
    async fn create_user(&self, input: CreateUser) -> Result<User> {
        let user = User::from_input(input)?;

        let mut tables = self.tables.write();
        if tables.username_taken(&user.username, None) {
            bail!("username {} is already taken", user.username);
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.read();
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn update_profile(&self, id: Uuid, input: UpdateProfile) -> Result<Option<User>> {
        let mut tables = self.tables.write();
        if tables.username_taken(&input.username, Some(id)) {
            bail!("username {} is already taken", input.username);
        }
        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        user.apply_profile(input);
        Ok(Some(user.clone()))
    }

    async fn create_category(&self, input: CreateCategory) -> Result<Category> {
        let category = Category::from_input(input);

        let mut tables = self.tables.write();
        if tables.categories.values().any(|c| c.slug == category.slug) {
            bail!("category slug {} is already taken", category.slug);
        }
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let tables = self.tables.read();
        Ok(tables.categories.values().find(|c| c.slug == slug).cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let mut categories: Vec<Category> =
            self.tables.read().categories.values().cloned().collect();
        categories.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
        Ok(categories)
    }

    async fn create_location(&self, input: CreateLocation) -> Result<Location> {
        let location = Location::from_input(input);
        self.tables
            .write()
            .locations
            .insert(location.id, location.clone());
        Ok(location)
    }

    async fn list_locations(&self) -> Result<Vec<Location>> {
        let mut locations: Vec<Location> =
            self.tables.read().locations.values().cloned().collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(locations)
    }

    async fn create_post(&self, input: CreatePost) -> Result<Post> {
        let post = Post::from_input(input);

        let mut tables = self.tables.write();
        if !tables.users.contains_key(&post.author_id) {
            bail!("author {} does not exist", post.author_id);
        }
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<PostSummary>> {
        let tables = self.tables.read();
        Ok(tables.posts.get(&id).and_then(|post| tables.summarize(post)))
    }

    async fn update_post(&self, id: Uuid, input: UpdatePost) -> Result<Option<Post>> {
        let mut tables = self.tables.write();
        let Some(post) = tables.posts.get_mut(&id) else {
            return Ok(None);
        };
        post.apply(input);
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write();
        let removed = tables.posts.remove(&id).is_some();
        if removed {
            tables.comments.retain(|_, c| c.post_id != id);
        }
        Ok(removed)
    }

    async fn count_posts(&self, query: &PostQuery) -> Result<u64> {
        Ok(self.tables.read().select(query).len() as u64)
    }

    async fn list_posts(
        &self,
        query: &PostQuery,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<PostSummary>> {
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let rows = self.tables.read().select(query);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn create_comment(&self, input: CreateComment) -> Result<Comment> {
        let comment = Comment::from_input(input);

        let mut tables = self.tables.write();
        if !tables.posts.contains_key(&comment.post_id) {
            bail!("post {} does not exist", comment.post_id);
        }
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn find_comment(&self, post_id: Uuid, id: Uuid) -> Result<Option<Comment>> {
        let tables = self.tables.read();
        Ok(tables
            .comments
            .get(&id)
            .filter(|c| c.post_id == post_id)
            .cloned())
    }

    async fn update_comment(&self, id: Uuid, text: &str) -> Result<Option<Comment>> {
        let mut tables = self.tables.write();
        let Some(comment) = tables.comments.get_mut(&id) else {
            return Ok(None);
        };
        comment.text = text.to_string();
        Ok(Some(comment.clone()))
    }

    async fn delete_comment(&self, id: Uuid) -> Result<bool> {
        Ok(self.tables.write().comments.remove(&id).is_some())
    }

    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>> {
        let tables = self.tables.read();
        let mut comments: Vec<CommentWithAuthor> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .filter_map(|c| {
                let author = tables.users.get(&c.author_id)?;
                Some(CommentWithAuthor {
                    id: c.id,
                    text: c.text.clone(),
                    post_id: c.post_id,
                    author_id: c.author_id,
                    author_username: author.username.clone(),
                    created_at: c.created_at,
                })
            })
            .collect();
        comments.sort_by(compare_oldest_first);
        Ok(comments)
    }

    async fn ping(&self) -> bool {
        true
    }
}
