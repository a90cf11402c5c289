//! HTTP server initialization and runtime setup.
//!
//! Handles the database pool, migrations, analytics worker spawning and the Axum
//! server lifecycle.

use crate::application::services::{AuthService, LinkService};
use crate::config::Config;
use crate::domain::analytics_recorder::{AnalyticsRecorder, run_analytics_worker};
use crate::infrastructure::persistence::{PgAnalyticsRepository, PgTokenRepository, PgUrlRepository};
use crate::routes::app_router;
use crate::state::AppState;
use crate::utils::code_generator::RandomCodeGenerator;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

/// How long shutdown waits for queued analytics to be written.
const ANALYTICS_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Background analytics worker
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to apply migrations")?;

    let pool = Arc::new(pool);
    let url_repository = Arc::new(PgUrlRepository::new(pool.clone()));
    let analytics_repository = Arc::new(PgAnalyticsRepository::new(pool.clone()));
    let token_repository = Arc::new(PgTokenRepository::new(pool.clone()));

    let (recorder, analytics_rx) = AnalyticsRecorder::channel(config.analytics_queue_capacity);
    let worker = tokio::spawn(run_analytics_worker(
        analytics_rx,
        analytics_repository.clone(),
        config.analytics_worker_concurrency,
    ));
    tracing::info!(
        concurrency = config.analytics_worker_concurrency,
        "Analytics worker started"
    );

    let link_service = Arc::new(LinkService::new(
        url_repository,
        analytics_repository,
        recorder,
        Arc::new(RandomCodeGenerator::new(config.code_length)),
        config.link_policy()?,
    ));
    let auth_service = Arc::new(AuthService::new(
        token_repository,
        config.token_signing_secret.clone(),
    ));

    let state = AppState::new(link_service, auth_service, config.base_url.clone());
    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // The router owned the last recorder; the worker exits once the queue drains.
    match tokio::time::timeout(ANALYTICS_DRAIN_TIMEOUT, worker).await {
        Ok(_) => tracing::info!("Analytics worker drained"),
        Err(_) => tracing::warn!("Timed out waiting for analytics worker"),
    }

    Ok(())
}

/// Resolves on SIGINT or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
