//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration, login, argon2 hashing, bearer JWTs
//! - `orders` - Placement, status transitions, order queries
//! - `products` - Product CRUD, sale flag, search, bulk import
//! - `catalog` - Categories and plants
//! - `users` - Account administration
//! - `ratings` - Product ratings
//! - `blog` - Posts, comments and moderation
//! - `notifications` - Email outbox and its delivery worker
//! - `storage` - Uploaded photos on disk
//! - `cleanup` - Daily orphaned photo removal
//!
//! Services borrow the [`Repositories`](crate::db::Repositories) for the
//! duration of one request and return [`AppError`](crate::error::AppError).

pub mod auth;
pub mod blog;
pub mod catalog;
pub mod cleanup;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod ratings;
pub mod storage;
pub mod users;

/// Caller identity as seen by permission checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: succulent_shop_core::UserId,
    pub role: succulent_shop_core::Role,
}

impl Actor {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, succulent_shop_core::Role::Admin)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod fixtures {
    use rust_decimal::Decimal;

    use succulent_shop_core::product::ProductDraft;
    use succulent_shop_core::requests::UserDraft;
    use succulent_shop_core::{Email, Product, ProductType, Role};

    use crate::db::Repositories;
    use crate::models::User;

    pub fn user_draft(email: &str, role: Role) -> UserDraft {
        UserDraft {
            firstname: "Mila".to_owned(),
            lastname: "Horvat".to_owned(),
            email: Email::parse(email).unwrap(),
            password: None,
            role,
            address: "Agave 7".to_owned(),
        }
    }

    pub fn decor_draft(name: &str, price: &str) -> ProductDraft {
        ProductDraft {
            name: name.to_owned(),
            description: format!("{name} for the windowsill"),
            product_type: ProductType::Decor,
            plant_id: None,
            is_pot: false,
            pot_size: None,
            pot_type: None,
            pot_number: 0,
            tool_type: None,
            base_price: price.parse::<Decimal>().unwrap(),
            quantity: 5,
            active: true,
        }
    }

    pub async fn seed_user(repos: &Repositories, email: &str, role: Role) -> User {
        repos
            .users
            .insert(&user_draft(email, role), "$argon2id$unused")
            .await
            .unwrap()
    }

    pub async fn seed_product(repos: &Repositories, name: &str, price: &str) -> Product {
        repos
            .products
            .insert(&decor_draft(name, price), None)
            .await
            .unwrap()
    }
}
