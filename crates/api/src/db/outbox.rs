//! Notification outbox.
//!
//! Rows are inserted as `pending` and drained by the notification worker.
//! A row leaves `pending` exactly once: to `sent`, or to `failed` after the
//! last allowed attempt.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use succulent_shop_core::NotificationId;

use super::{PgStore, RepositoryError, parse_column};
use crate::models::{NewNotification, Notification};

#[async_trait]
pub trait OutboxRepository: Send + Sync {
    async fn enqueue(
        &self,
        notification: &NewNotification,
        now: DateTime<Utc>,
    ) -> Result<Notification, RepositoryError>;

    /// Pending notifications whose next attempt is at or before `now`, oldest first.
    async fn due(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Notification>, RepositoryError>;

    async fn mark_sent(&self, id: NotificationId, now: DateTime<Utc>)
    -> Result<(), RepositoryError>;

    /// Record a failed attempt and schedule the next one.
    async fn mark_retry(
        &self,
        id: NotificationId,
        error: &str,
        next_attempt_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    /// Record the final failed attempt.
    async fn mark_failed(&self, id: NotificationId, error: &str) -> Result<(), RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: NotificationId,
    recipient: String,
    subject: String,
    text_body: String,
    html_body: String,
    status: String,
    attempts: i32,
    next_attempt_at: DateTime<Utc>,
    last_error: Option<String>,
    created_at: DateTime<Utc>,
    sent_at: Option<DateTime<Utc>>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = RepositoryError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            recipient: row.recipient,
            subject: row.subject,
            text_body: row.text_body,
            html_body: row.html_body,
            status: parse_column(&row.status, "notification status")?,
            attempts: row.attempts,
            next_attempt_at: row.next_attempt_at,
            last_error: row.last_error,
            created_at: row.created_at,
            sent_at: row.sent_at,
        })
    }
}

const NOTIFICATION_COLUMNS: &str = "id, recipient, subject, text_body, html_body, status, \
     attempts, next_attempt_at, last_error, created_at, sent_at";

#[async_trait]
impl OutboxRepository for PgStore {
    async fn enqueue(
        &self,
        notification: &NewNotification,
        now: DateTime<Utc>,
    ) -> Result<Notification, RepositoryError> {
        let row: NotificationRow = sqlx::query_as(&format!(
            r"
            INSERT INTO notifications (recipient, subject, text_body, html_body, next_attempt_at,
                                       created_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING {NOTIFICATION_COLUMNS}
            "
        ))
        .bind(&notification.recipient)
        .bind(&notification.subject)
        .bind(&notification.text_body)
        .bind(&notification.html_body)
        .bind(now)
        .fetch_one(self.pool())
        .await?;
        Notification::try_from(row)
    }

    async fn due(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let rows: Vec<NotificationRow> = sqlx::query_as(&format!(
            r"
            SELECT {NOTIFICATION_COLUMNS}
            FROM notifications
            WHERE status = 'pending' AND next_attempt_at <= $1
            ORDER BY next_attempt_at, id
            LIMIT $2
            "
        ))
        .bind(now)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        rows.into_iter().map(Notification::try_from).collect()
    }

    async fn mark_sent(
        &self,
        id: NotificationId,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            UPDATE notifications
            SET status = 'sent', attempts = attempts + 1, sent_at = $2, last_error = NULL
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(now)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn mark_retry(
        &self,
        id: NotificationId,
        error: &str,
        next_attempt_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            UPDATE notifications
            SET attempts = attempts + 1, last_error = $2, next_attempt_at = $3
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(error)
        .bind(next_attempt_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn mark_failed(&self, id: NotificationId, error: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            UPDATE notifications
            SET status = 'failed', attempts = attempts + 1, last_error = $2
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(error)
        .execute(self.pool())
        .await?;
        Ok(())
    }
}
