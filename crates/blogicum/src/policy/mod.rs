//! Who may see or change what, and how listings are shaped.
//!
//! - [`visibility`]: per-object visibility and ownership checks
//! - [`query`]: listing query descriptions and their ordering
//! - [`pagination`]: page slicing for listings

pub mod pagination;
pub mod query;
pub mod visibility;

pub use pagination::{DEFAULT_PAGE_SIZE, Page, PageWindow, paginate};
pub use query::{PostQuery, ProfileListingPolicy, VisibilityFilter};
pub use visibility::{OwnershipFailure, Viewer, check_owner, is_owner, is_visible};
