//! User domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use succulent_shop_core::{Email, Role, UserId};

/// A shop account.
///
/// The password hash never leaves the server: it is skipped when serializing
/// and redacted from `Debug`.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub firstname: String,
    pub lastname: String,
    pub email: Email,
    pub role: Role,
    pub address: String,
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("password_hash", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}
