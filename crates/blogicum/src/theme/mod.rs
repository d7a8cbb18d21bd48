//! Theme engine and template view models.
//!
//! Templates are compiled into the binary and auto-escaped.

mod engine;
pub mod view;

pub use engine::ThemeEngine;
pub use view::{CommentView, PostView, ViewerView};
