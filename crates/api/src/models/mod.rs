//! Domain models owned by the API crate.
//!
//! Products and orders live in `succulent_shop_core` because their pricing and
//! status rules are shared. The types here are the remaining catalog, account
//! and content entities plus the JSON views handed to clients.

pub mod blog;
pub mod catalog;
pub mod notification;
pub mod product;
pub mod rating;
pub mod user;

pub use blog::{Blog, Comment};
pub use catalog::{Category, Plant};
pub use notification::{NewNotification, Notification, NotificationStatus};
pub use product::{BulkImportResponse, ProductView};
pub use rating::Rating;
pub use user::User;
