//! Usergroups Service
//!
//! Serves the group views for every kind listed in `USERGROUPS_KINDS`.
//! Uses Postgres when `DATABASE_URL` is set and an in-process store otherwise.

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use usergroups::database::{create_pool, run_migrations};
use usergroups::services::{LogNotifier, Notifier, WebhookNotifier};
use usergroups::web::{self, AppState};
use usergroups::{AppConfig, GroupConfiguration, GroupRegistry, GroupStore, MemoryStore, PgStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables first
    dotenv::dotenv().ok();

    let config = AppConfig::from_env()
        .map_err(anyhow::Error::msg)
        .context("Configuration error")?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("usergroups={},sqlx=warn,tower_http=info", config.log_level).into()
    });
    if config.is_production() {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("Usergroups service starting");
    info!("Environment: {}", config.environment);
    info!("Log level: {}", config.log_level);

    // =========================================================================
    // STORAGE
    // =========================================================================
    let store: Arc<dyn GroupStore> = match &config.database {
        Some(database) => {
            info!("Connecting to database...");
            let pool = create_pool(database)
                .await
                .context("Failed to create database pool")?;
            info!("Max connections: {}", database.max_connections);

            run_migrations(&pool, None)
                .await
                .context("Database migration failed")?;
            info!("Database migrations completed successfully");

            Arc::new(PgStore::new(pool))
        }
        None => {
            if config.is_production() {
                warn!("DATABASE_URL not set in production; data will not survive a restart");
            }
            info!("Using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    // =========================================================================
    // GROUP KINDS AND NOTIFICATIONS
    // =========================================================================
    let mut registry = GroupRegistry::new();
    for kind in &config.group_kinds {
        registry
            .register(
                GroupConfiguration::new(kind.as_str())
                    .with_notifications(config.notifications.enabled),
            )
            .with_context(|| format!("Cannot register group kind '{}'", kind))?;
        info!("Registered group kind '{}'", kind);
    }

    let notifier: Arc<dyn Notifier> = match &config.notifications.webhook_url {
        Some(url) => {
            info!("Delivering notifications to webhook {}", url);
            Arc::new(WebhookNotifier::new(url.as_str()))
        }
        None => Arc::new(LogNotifier),
    };

    let state = AppState::new(registry, store, notifier)
        .with_user_header(&config.user_header)
        .context("Invalid USERGROUPS_USER_HEADER")?;
    let app = web::router(state);

    // =========================================================================
    // SERVE
    // =========================================================================
    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Listening on {}", addr);
    info!("Press Ctrl+C to shutdown gracefully");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Usergroups service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, shutting down gracefully..."),
        Err(e) => {
            warn!("Could not listen for shutdown signal: {}", e);
            futures::future::pending::<()>().await;
        }
    }
}
