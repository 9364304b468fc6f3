//! Inbound request bodies.
//!
//! Each request deserializes leniently (every field optional, enums as plain
//! strings) and is turned into a typed draft by its `validate` method, which
//! reports every problem at once.

pub mod blog;
pub mod catalog;
pub mod order;
pub mod product;
pub mod rating;
pub mod search;
pub mod user;

pub use blog::{BlogDraft, BlogRequest, CommentDraft, CommentRequest};
pub use catalog::{CategoryDraft, CategoryRequest, PlantDraft, PlantRequest};
pub use order::{OrderDraft, OrderRequest};
pub use product::ProductRequest;
pub use rating::{RatingDraft, RatingRequest};
pub use search::{BlogSearch, PlantFilter, PlantSearch, ProductFilter, ProductSearch};
pub use user::{LoginRequest, RegisterRequest, UserDraft, UserRequest};
