//! Database models.

pub mod category;
pub mod comment;
pub mod location;
pub mod post;
pub mod user;

pub use category::{Category, CreateCategory};
pub use comment::{Comment, CommentWithAuthor, CreateComment};
pub use location::{CreateLocation, Location};
pub use post::{CreatePost, Post, PostSummary, UpdatePost};
pub use user::{CreateUser, UpdateProfile, User};
