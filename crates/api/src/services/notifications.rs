//! Email notifications through the outbox.
//!
//! Services enqueue a rendered [`NewNotification`]; the [`OutboxWorker`]
//! delivers due rows through a [`Mailer`] and reschedules failures with
//! exponential backoff.

use std::sync::Arc;
use std::time::Duration;

use askama::Template;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use thiserror::Error;
use tokio::sync::watch;

use succulent_shop_core::{Order, OrderItem};

use crate::config::{JobsConfig, SmtpConfig};
use crate::db::{OutboxRepository, RepositoryError};
use crate::models::{NewNotification, Notification, User};

/// Most rows handled per worker pass.
const BATCH_SIZE: i64 = 20;

#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    name: &'a str,
    code: &'a str,
    items: &'a [OrderItem],
    subtotal: Decimal,
    delivery_cost: Decimal,
    delivery_method: &'a str,
    total: Decimal,
    address: &'a str,
}

#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    name: &'a str,
    code: &'a str,
    items: &'a [OrderItem],
    subtotal: Decimal,
    delivery_cost: Decimal,
    delivery_method: &'a str,
    total: Decimal,
    address: &'a str,
}

#[derive(Template)]
#[template(path = "email/order_status.html")]
struct OrderStatusHtml<'a> {
    name: &'a str,
    code: &'a str,
    status: &'a str,
}

#[derive(Template)]
#[template(path = "email/order_status.txt")]
struct OrderStatusText<'a> {
    name: &'a str,
    code: &'a str,
    status: &'a str,
}

/// Errors that can occur when rendering or sending email.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Render the order confirmation for `user`.
///
/// # Errors
///
/// Returns `MailError::Template` if rendering fails.
pub fn order_confirmation(order: &Order, user: &User) -> Result<NewNotification, MailError> {
    let name = user.full_name();
    let html = OrderConfirmationHtml {
        name: &name,
        code: &order.code,
        items: &order.items,
        subtotal: order.subtotal,
        delivery_cost: order.delivery_cost,
        delivery_method: order.delivery_method.as_str(),
        total: order.total,
        address: &order.address,
    }
    .render()?;
    let text = OrderConfirmationText {
        name: &name,
        code: &order.code,
        items: &order.items,
        subtotal: order.subtotal,
        delivery_cost: order.delivery_cost,
        delivery_method: order.delivery_method.as_str(),
        total: order.total,
        address: &order.address,
    }
    .render()?;

    Ok(NewNotification {
        recipient: user.email.as_str().to_owned(),
        subject: format!("Order confirmation {}", order.code),
        text_body: text,
        html_body: html,
    })
}

/// Render the status-change notice for `user`.
///
/// # Errors
///
/// Returns `MailError::Template` if rendering fails.
pub fn status_change(order: &Order, user: &User) -> Result<NewNotification, MailError> {
    let name = user.full_name();
    let status = order.status.as_str();
    let html = OrderStatusHtml {
        name: &name,
        code: &order.code,
        status,
    }
    .render()?;
    let text = OrderStatusText {
        name: &name,
        code: &order.code,
        status,
    }
    .render()?;

    Ok(NewNotification {
        recipient: user.email.as_str().to_owned(),
        subject: format!("Order {} is now {status}", order.code),
        text_body: text,
        html_body: html,
    })
}

/// Delivers one notification.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), MailError>;
}

/// SMTP delivery via lettre.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    /// # Errors
    ///
    /// Returns error if the relay cannot be configured.
    pub fn new(config: &SmtpConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            transport,
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, notification: &Notification) -> Result<(), MailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| MailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(notification
                .recipient
                .parse()
                .map_err(|_| MailError::InvalidAddress(notification.recipient.clone()))?)
            .subject(notification.subject.clone())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(notification.text_body.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(notification.html_body.clone()),
                    ),
            )?;

        self.transport.send(email).await?;
        tracing::info!(to = %notification.recipient, subject = %notification.subject, "Email sent");
        Ok(())
    }
}

/// Logs instead of sending. Used when SMTP is not configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, notification: &Notification) -> Result<(), MailError> {
        tracing::info!(
            to = %notification.recipient,
            subject = %notification.subject,
            "SMTP not configured, email logged only"
        );
        Ok(())
    }
}

/// Retry schedule for failed deliveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(30),
            max_delay: Duration::from_secs(3600),
            max_attempts: 5,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn from_jobs(jobs: &JobsConfig) -> Self {
        Self {
            max_attempts: jobs.outbox_max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Delay before the next try after `attempts` failed ones:
    /// `base × 2^(attempts−1)`, capped at `max_delay`.
    #[must_use]
    pub fn backoff(&self, attempts: u32) -> Duration {
        let exponent = attempts.saturating_sub(1).min(31);
        self.base_delay
            .checked_mul(1_u32 << exponent)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Whether `attempts` failed tries exhaust the budget.
    #[must_use]
    pub const fn exhausted(&self, attempts: u32) -> bool {
        attempts >= self.max_attempts
    }
}

/// Counts from one worker pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    pub sent: usize,
    pub retried: usize,
    pub failed: usize,
}

/// Drains due outbox rows.
#[derive(Clone)]
pub struct OutboxWorker {
    outbox: Arc<dyn OutboxRepository>,
    mailer: Arc<dyn Mailer>,
    policy: RetryPolicy,
}

impl OutboxWorker {
    #[must_use]
    pub fn new(
        outbox: Arc<dyn OutboxRepository>,
        mailer: Arc<dyn Mailer>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            outbox,
            mailer,
            policy,
        }
    }

    /// Send every due notification once.
    ///
    /// # Errors
    ///
    /// Returns repository errors; delivery errors are recorded on the row.
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<DrainReport, RepositoryError> {
        let mut report = DrainReport::default();
        for notification in self.outbox.due(now, BATCH_SIZE).await? {
            match self.mailer.send(&notification).await {
                Ok(()) => {
                    self.outbox.mark_sent(notification.id, now).await?;
                    report.sent += 1;
                }
                Err(e) => {
                    let attempts = u32::try_from(notification.attempts)
                        .unwrap_or_default()
                        .saturating_add(1);
                    let error = e.to_string();
                    if self.policy.exhausted(attempts) {
                        tracing::error!(
                            notification_id = %notification.id,
                            attempts,
                            error = %error,
                            "Giving up on notification"
                        );
                        self.outbox.mark_failed(notification.id, &error).await?;
                        report.failed += 1;
                    } else {
                        let delay = self.policy.backoff(attempts);
                        let next = now
                            + chrono::Duration::from_std(delay)
                                .unwrap_or_else(|_| chrono::Duration::hours(1));
                        tracing::warn!(
                            notification_id = %notification.id,
                            attempts,
                            retry_in_secs = delay.as_secs(),
                            error = %error,
                            "Notification delivery failed"
                        );
                        self.outbox.mark_retry(notification.id, &error, next).await?;
                        report.retried += 1;
                    }
                }
            }
        }
        Ok(report)
    }

    /// Poll until `shutdown` flips to `true`.
    pub async fn run(self, poll_interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tracing::info!(poll_secs = poll_interval.as_secs(), "Outbox worker started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.run_once(Utc::now()).await {
                        Ok(report) if report != DrainReport::default() => {
                            tracing::debug!(?report, "Outbox pass finished");
                        }
                        Ok(_) => {}
                        Err(e) => tracing::error!(error = %e, "Outbox pass failed"),
                    }
                }
                _ = shutdown.changed() => break,
            }
        }
        tracing::info!("Outbox worker stopped");
    }
}

/// Enqueue without failing the caller; errors are logged.
pub async fn enqueue_best_effort(
    outbox: &dyn OutboxRepository,
    rendered: Result<NewNotification, MailError>,
    now: DateTime<Utc>,
) {
    let notification = match rendered {
        Ok(notification) => notification,
        Err(e) => {
            tracing::error!(error = %e, "Failed to render notification");
            return;
        }
    };
    if let Err(e) = outbox.enqueue(&notification, now).await {
        tracing::error!(
            error = %e,
            recipient = %notification.recipient,
            "Failed to enqueue notification"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::TimeZone;
    use succulent_shop_core::{DeliveryMethod, Email, OrderId, OrderStatus, ProductId, Role, UserId};

    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::models::NotificationStatus;

    struct FlakyMailer {
        failures_left: AtomicUsize,
    }

    #[async_trait]
    impl Mailer for FlakyMailer {
        async fn send(&self, _notification: &Notification) -> Result<(), MailError> {
            let left = self.failures_left.load(Ordering::SeqCst);
            if left == 0 {
                return Ok(());
            }
            self.failures_left.store(left - 1, Ordering::SeqCst);
            Err(MailError::InvalidAddress("relay refused".to_owned()))
        }
    }

    fn user() -> User {
        User {
            id: UserId::new(1),
            firstname: "Mila".to_owned(),
            lastname: "Horvat".to_owned(),
            email: Email::parse("mila@example.com").unwrap(),
            role: Role::User,
            address: "Agave 7".to_owned(),
            password_hash: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn order() -> Order {
        Order::place(
            OrderId::new(7),
            UserId::new(1),
            vec![OrderItem {
                product_id: ProductId::new(3),
                product_name: "Echeveria <Lola>".to_owned(),
                unit_price: "12.50".parse().unwrap(),
            }],
            "Agave 7".to_owned(),
            DeliveryMethod::ExpressDelivery,
            Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
        )
    }

    fn new_notification() -> NewNotification {
        NewNotification {
            recipient: "mila@example.com".to_owned(),
            subject: "hi".to_owned(),
            text_body: "hi".to_owned(),
            html_body: "<p>hi</p>".to_owned(),
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_secs(30));
        assert_eq!(policy.backoff(2), Duration::from_secs(60));
        assert_eq!(policy.backoff(3), Duration::from_secs(120));
        assert_eq!(policy.backoff(8), Duration::from_secs(3600));
        assert_eq!(policy.backoff(200), Duration::from_secs(3600));
    }

    #[test]
    fn test_order_confirmation_renders_totals() {
        let rendered = order_confirmation(&order(), &user()).unwrap();
        assert_eq!(rendered.recipient, "mila@example.com");
        assert_eq!(rendered.subject, "Order confirmation ORD720240501");
        assert!(rendered.text_body.contains("Echeveria <Lola>: 12.50"));
        assert!(rendered.text_body.contains("Total: 20.50"));
        assert!(!rendered.html_body.contains("<Lola>"));
    }

    #[test]
    fn test_status_change_subject() {
        let mut order = order();
        order.transition_to(OrderStatus::Processing, Utc::now()).unwrap();
        let rendered = status_change(&order, &user()).unwrap();
        assert_eq!(rendered.subject, "Order ORD720240501 is now PROCESSING");
        assert!(rendered.text_body.contains("Mila Horvat"));
    }

    #[tokio::test]
    async fn test_worker_sends_due_notifications() {
        let store = Arc::new(MemoryStore::default());
        let now = Utc::now();
        store.enqueue(&new_notification(), now).await.unwrap();

        let worker = OutboxWorker::new(store.clone(), Arc::new(LogMailer), RetryPolicy::default());
        let report = worker.run_once(now).await.unwrap();
        assert_eq!(report.sent, 1);

        let rows = store.notifications().await;
        assert_eq!(rows[0].status, NotificationStatus::Sent);
        assert_eq!(rows[0].attempts, 1);
        assert_eq!(worker.run_once(now).await.unwrap(), DrainReport::default());
    }

    #[tokio::test]
    async fn test_worker_retries_then_fails() {
        let store = Arc::new(MemoryStore::default());
        let start = Utc::now();
        store.enqueue(&new_notification(), start).await.unwrap();

        let policy = RetryPolicy {
            max_attempts: 2,
            ..RetryPolicy::default()
        };
        let mailer = Arc::new(FlakyMailer {
            failures_left: AtomicUsize::new(10),
        });
        let worker = OutboxWorker::new(store.clone(), mailer, policy);

        let first = worker.run_once(start).await.unwrap();
        assert_eq!(first.retried, 1);
        let row = store.notifications().await.remove(0);
        assert_eq!(row.status, NotificationStatus::Pending);
        assert_eq!(row.next_attempt_at, start + chrono::Duration::seconds(30));

        // Not due yet.
        assert_eq!(worker.run_once(start).await.unwrap(), DrainReport::default());

        let later = start + chrono::Duration::seconds(31);
        let second = worker.run_once(later).await.unwrap();
        assert_eq!(second.failed, 1);
        let row = store.notifications().await.remove(0);
        assert_eq!(row.status, NotificationStatus::Failed);
        assert_eq!(row.attempts, 2);
        assert!(row.last_error.is_some());
    }
}
