use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use bloodwork_api::api::handlers::health::create_health_service;
use bloodwork_api::{create_app, BloodworkService};
use bloodwork_data::database::{DatabaseConfig, DatabasePool};
use bloodwork_data::repository::BloodworkRepository;
use bloodwork_domain::config::EvaluationSettings;
use bloodwork_domain::services::create_default_bloodwork_service;

/// Open the configured SQLite database, or `None` when it cannot be used
fn open_database(data_dir: &str) -> Option<DatabasePool> {
    // DB_SQLITE_PATH wins; otherwise the database lives in the data directory
    if std::env::var("DB_SQLITE_PATH").is_err() {
        let db_path = PathBuf::from(data_dir).join("bloodwork.db");
        std::env::set_var("DB_SQLITE_PATH", db_path.to_string_lossy().to_string());
        info!("Set DB_SQLITE_PATH to {}", db_path.display());
    }

    let config = match DatabaseConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid database configuration: {}", e);
            return None;
        }
    };

    match DatabasePool::connect(&config) {
        Ok(pool) => {
            info!("Using {}", pool.connection_info());
            Some(pool)
        }
        Err(e) => {
            error!("Failed to initialize database pool: {}", e);
            None
        }
    }
}

/// Entry point for the bloodwork API server
///
/// Falls back to in-memory storage when the database cannot be opened; the
/// health endpoint then reports the service as degraded.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if dotenv().is_err() {
        eprintln!("Warning: .env file not found or couldn't be read. Using environment variables.");
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_span_events(FmtSpan::CLOSE)
                .with_target(false)
                .with_ansi(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stdout),
        )
        .with(env_filter)
        .init();

    info!("Starting bloodwork API server");

    let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string());
    if !PathBuf::from(&data_dir).exists() {
        info!("Creating data directory: {}", data_dir);
        std::fs::create_dir_all(&data_dir).with_context(|| format!("Failed to create data directory {}", data_dir))?;
    }

    let settings = EvaluationSettings::from_env().context("Invalid evaluation settings")?;
    info!("Values without an explicit sex are classified as {:?}", settings.default_sex);

    let pool = open_database(&data_dir);
    let repository = match &pool {
        Some(pool) => BloodworkRepository::with_database(pool.clone()),
        None => {
            warn!("Falling back to in-memory storage; data will not survive a restart");
            BloodworkRepository::in_memory().context("Failed to load the bundled catalog")?
        }
    };

    let service: BloodworkService = Arc::new(create_default_bloodwork_service(repository, settings));
    let app = create_app(service, create_health_service(pool));

    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .context("PORT must be a number")?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await.with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Wait for CTRL+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
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
