//! User repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use succulent_shop_core::pagination::PageSpec;
use succulent_shop_core::requests::UserDraft;
use succulent_shop_core::{Email, Page, UserId};

use super::{PgStore, RepositoryError, count_to_u64, map_constraint, parse_column};
use crate::models::User;

pub const SORT_FIELDS: &[(&str, &str)] = &[
    ("id", "id"),
    ("email", "email"),
    ("firstname", "firstname"),
    ("lastname", "lastname"),
    ("role", "role"),
    ("createdAt", "created_at"),
];

const EMAIL_TAKEN: &str = "email already exists";

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    /// Case-insensitive lookup.
    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;
    async fn list(&self, page: &PageSpec) -> Result<Page<User>, RepositoryError>;
    async fn insert(&self, draft: &UserDraft, password_hash: &str)
    -> Result<User, RepositoryError>;
    /// `password_hash: None` keeps the current password.
    async fn update(
        &self,
        id: UserId,
        draft: &UserDraft,
        password_hash: Option<&str>,
    ) -> Result<User, RepositoryError>;
    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    firstname: String,
    lastname: String,
    email: String,
    role: String,
    address: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        Ok(Self {
            id: row.id,
            firstname: row.firstname,
            lastname: row.lastname,
            email,
            role: parse_column(&row.role, "role")?,
            address: row.address,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const USER_COLUMNS: &str =
    "id, firstname, lastname, email, role, address, password_hash, created_at, updated_at";

#[async_trait]
impl UserRepository for PgStore {
    async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool())
                .await?;
        row.map(User::try_from).transpose()
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool())
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn list(&self, page: &PageSpec) -> Result<Page<User>, RepositoryError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool())
            .await?;
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY {} {}, id ASC LIMIT $1 OFFSET $2",
            page.sort_column,
            page.direction.as_sql()
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool())
        .await?;
        let users = rows
            .into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(users, page, count_to_u64(total)))
    }

    async fn insert(
        &self,
        draft: &UserDraft,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let row: UserRow = sqlx::query_as(&format!(
            r"
            INSERT INTO users (firstname, lastname, email, role, address, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(&draft.firstname)
        .bind(&draft.lastname)
        .bind(draft.email.as_str())
        .bind(draft.role.as_str())
        .bind(&draft.address)
        .bind(password_hash)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_constraint(e, EMAIL_TAKEN))?;
        User::try_from(row)
    }

    async fn update(
        &self,
        id: UserId,
        draft: &UserDraft,
        password_hash: Option<&str>,
    ) -> Result<User, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r"
            UPDATE users
            SET firstname = $2, lastname = $3, email = $4, role = $5, address = $6,
                password_hash = COALESCE($7, password_hash), updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&draft.firstname)
        .bind(&draft.lastname)
        .bind(draft.email.as_str())
        .bind(draft.role.as_str())
        .bind(&draft.address)
        .bind(password_hash)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_constraint(e, EMAIL_TAKEN))?;
        row.ok_or(RepositoryError::NotFound).and_then(User::try_from)
    }

    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(|e| map_constraint(e, "user still has orders, ratings or posts"))?;
        Ok(result.rows_affected() > 0)
    }
}
