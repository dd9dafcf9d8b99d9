use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use isdb_api::config::ServerConfig;
use isdb_api::handlers::data::reload_store;
use isdb_api::router::build_app_router;
use isdb_api::state::AppState;
use isdb_core::backup::BackupManager;
use isdb_core::config::{ConfigManager, HealthStatus};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "isdb_api=debug,isdb_db=debug,isdb_core=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let config_manager = Arc::new(ConfigManager::new(&config.config_dir));
    if config_manager.validate_all() {
        tracing::info!("Configuration system initialized successfully");
    } else {
        tracing::warn!("Configuration validation found issues, using fallback configurations");
    }
    let health = config_manager.health_check();
    for issue in &health.issues {
        tracing::warn!(%issue, "Configuration issue");
    }
    if health.overall_status == HealthStatus::Unhealthy {
        tracing::error!("Configuration system is unhealthy, check the configuration directory");
    }

    // --- Database ---
    let pool = isdb_db::create_pool(&config.database_url)
        .await
        .expect("Failed to open database");
    tracing::info!(url = %config.database_url, "Database connection pool created");

    isdb_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    isdb_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    if isdb_db::ensure_fts(&pool).await {
        tracing::info!("Full-text index ready");
    }

    // --- Backups ---
    let backups = Arc::new(BackupManager::new(&config.backup_dir));
    if let Err(e) = backups.setup() {
        tracing::warn!(error = %e, "Backup directory setup failed");
    }

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        config_manager,
        backups,
    };

    // --- Initial load ---
    match reload_store(&state).await {
        Ok(report) => tracing::info!(
            stored = report.stored,
            errors = report.result.errors.len(),
            warnings = report.result.warnings.len(),
            "Initial data load finished"
        ),
        Err(e) => tracing::error!(error = %e, "Initial data load failed"),
    }

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
