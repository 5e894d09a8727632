use std::net::SocketAddr;
use std::path::PathBuf;
use dotenv::dotenv;
use thiserror::Error;
use tokio::signal;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use emo_cat_guide_api::create_application;
use emo_cat_guide_domain::auth::token_blacklist;
use emo_cat_guide_domain::config::AppConfig;
use emo_cat_guide_domain::services::StandardsError;

/// Failures that stop the server from starting or running
#[derive(Debug, Error)]
enum AppError {
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("Health standards could not be loaded: {0}")]
    Standards(#[from] StandardsError),
}

/// Entry point for the Health Emo Cat Guide API server
///
/// Loads `.env`, sets up tracing, prepares the data directory and the
/// database pool, then serves the router until Ctrl+C or SIGTERM.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if dotenv().is_err() {
        eprintln!("Warning: .env file not found or couldn't be read. Using environment variables.");
    }

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(false)
            .with_ansi(true)
            .with_timer(fmt::time::uptime())
            .with_writer(std::io::stdout))
        .with(env_filter)
        .init();

    info!("🐱 Starting Health Emo Cat Guide API server");

    if let Err(e) = run().await {
        error!("{}", e);
        return Err(Box::new(e) as Box<dyn std::error::Error>);
    }

    info!("Server shutdown complete");
    Ok(())
}

async fn run() -> Result<(), AppError> {
    let config = AppConfig::from_env();

    for dir in [&config.data_dir, &config.upload_dir] {
        if !dir.exists() {
            info!("Creating directory: {}", dir.display());
            std::fs::create_dir_all(dir)?;
        }
    }

    if std::env::var("DB_SQLITE_PATH").is_err() {
        let db_path: PathBuf = config.data_dir.join("emo_cat_guide.db");
        std::env::set_var("DB_SQLITE_PATH", db_path.to_string_lossy().to_string());
        info!("Set DB_SQLITE_PATH to {}", db_path.display());
    }

    // Without a pool the repositories keep data in memory
    match emo_cat_guide_domain::database::initialize_database_pool() {
        Ok(_) => info!("Database pool initialized successfully"),
        Err(e) => warn!("Failed to initialize database pool: {}. Falling back to in-memory storage", e),
    }

    token_blacklist::start_cleanup_task();

    let app = create_application(&config)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            },
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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

    info!("Shutting down server...");
}
