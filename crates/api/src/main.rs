//! Succulent Shop API - JSON backend for the shop.
//!
//! # Architecture
//!
//! - Axum web framework serving `/api/v1`
//! - `PostgreSQL` through sqlx repositories
//! - Uploaded photos on local disk
//! - Email notifications through a database outbox drained by a worker
//! - A daily sweep that removes photos no record references
//!
//! Migrations are not run on startup; use `shop-cli migrate`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use sentry::integrations::tracing as sentry_tracing;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use succulent_shop_api::config::ShopConfig;
use succulent_shop_api::db::{self, Repositories};
use succulent_shop_api::services::cleanup;
use succulent_shop_api::services::notifications::{
    LogMailer, Mailer, OutboxWorker, RetryPolicy, SmtpMailer,
};
use succulent_shop_api::state::AppState;

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ShopConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn build_mailer(config: &ShopConfig) -> Arc<dyn Mailer> {
    match &config.smtp {
        Some(smtp) => Arc::new(SmtpMailer::new(smtp).expect("Failed to configure SMTP relay")),
        None => {
            tracing::warn!("SMTP_HOST not set, notification emails will only be logged");
            Arc::new(LogMailer)
        }
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = ShopConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "succulent_shop_api=info,tower_http=debug".into());

    let json_layer = config
        .json_logs
        .then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!config.json_logs).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    let repos = Repositories::postgres(pool);
    let state = AppState::new(config.clone(), repos.clone());
    state
        .storage()
        .init()
        .await
        .expect("Failed to create upload directory");

    // Background jobs stop when the sender flips to true
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let worker = OutboxWorker::new(
        repos.outbox.clone(),
        build_mailer(&config),
        RetryPolicy::from_jobs(&config.jobs),
    );
    let outbox_task = tokio::spawn(worker.run(config.jobs.outbox_poll_interval, shutdown_rx.clone()));
    let cleanup_task = tokio::spawn(cleanup::run_daily(
        repos,
        state.storage().clone(),
        config.jobs.cleanup_hour,
        shutdown_rx,
    ));

    let app = succulent_shop_api::app(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let addr = config.socket_addr();
    tracing::info!("api listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    let _ = shutdown_tx.send(true);
    let _ = tokio::join!(outbox_task, cleanup_task);
    tracing::info!("Background jobs stopped");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
