//! Invenfinder Server
//!
//! Main entry point that wires the auth crates together and starts the
//! HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use invenfinder_api::{AppState, build_router};
use invenfinder_auth::SsoDelegate;
use invenfinder_auth::rate_limit::BucketSweeper;
use invenfinder_core::config::{AppConfig, DatabaseProvider};
use invenfinder_core::error::AppError;
use invenfinder_database::memory::{MemorySessionRepository, MemoryUserRepository};
use invenfinder_database::repositories::{PgSessionRepository, PgUserRepository};
use invenfinder_database::{PgPool, SessionRepository, UserRepository};

#[tokio::main]
async fn main() {
    let env = std::env::var("INVENFINDER_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

type Repositories = (
    Arc<dyn UserRepository>,
    Arc<dyn SessionRepository>,
    Option<PgPool>,
);

/// Builds the repositories for the configured provider.
async fn open_repositories(config: &AppConfig) -> Result<Repositories, AppError> {
    match config.database.provider {
        DatabaseProvider::Postgres => {
            let pool = invenfinder_database::connection::connect(&config.database).await?;
            invenfinder_database::migration::run_migrations(&pool).await?;
            let users: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(pool.clone()));
            let sessions: Arc<dyn SessionRepository> =
                Arc::new(PgSessionRepository::new(pool.clone()));
            Ok((users, sessions, Some(pool)))
        }
        DatabaseProvider::Memory => {
            tracing::warn!("Using in-memory storage; all users and sessions are lost on restart");
            let users: Arc<dyn UserRepository> = Arc::new(MemoryUserRepository::new());
            let sessions: Arc<dyn SessionRepository> = Arc::new(MemorySessionRepository::new());
            Ok((users, sessions, None))
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Invenfinder v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Storage ──────────────────────────────────────────
    tracing::info!(provider = %config.database.provider, "Opening storage");
    let (users, sessions, pool) = open_repositories(&config).await?;

    // ── Step 2: Identity providers ───────────────────────────────
    let sso = Arc::new(SsoDelegate::new(&config.sso)?);
    let discovered = sso.discover_all().await;
    tracing::info!(
        configured = config.sso.providers.len(),
        discovered,
        "SSO providers loaded"
    );

    // ── Step 3: Application state ────────────────────────────────
    let state = AppState::new(config.clone(), users, sessions, sso)?;

    // ── Step 4: Bucket sweeper ───────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = BucketSweeper::new(
        state.rate_limiter.clone(),
        Duration::from_secs(config.rate_limit.prune_interval_seconds),
    );
    let sweeper_handle = tokio::spawn(async move {
        sweeper.run(shutdown_rx).await;
    });

    // ── Step 5: HTTP server ──────────────────────────────────────
    let app = build_router(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!(addr = %addr, "Invenfinder server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Step 6: Shutdown ─────────────────────────────────────────
    tracing::info!("Shutting down");
    let _ = shutdown_tx.send(true);
    if let Err(e) = sweeper_handle.await {
        tracing::warn!(error = %e, "Bucket sweeper did not stop cleanly");
    }
    if let Some(pool) = pool {
        pool.close().await;
        tracing::info!("Database pool closed");
    }

    tracing::info!("Invenfinder server stopped");
    Ok(())
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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
