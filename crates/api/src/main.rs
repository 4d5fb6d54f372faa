use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use keeper_core::registry::DaoRegistry;
use keeper_db::PgDaoRegistry;
use keeper_pipeline::EngineConfig;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use keeper_api::config::ServerConfig;
use keeper_api::router::build_app_router;
use keeper_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "keeper_api=debug,keeper_pipeline=debug,keeper_chain=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let engine_config = EngineConfig::from_env();
    tracing::info!(config = ?engine_config, "Loaded engine configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = keeper_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    keeper_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    keeper_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Execution engine ---
    let registry: Arc<dyn DaoRegistry> = Arc::new(PgDaoRegistry::new(pool.clone()));
    let engine = Arc::new(engine_config.build_engine(Arc::clone(&registry)));

    // --- Batch scheduler ---
    let scheduler_cancel = CancellationToken::new();
    let scheduler_handle = if config.scheduler_enabled {
        let scheduler = engine_config.build_scheduler(Arc::clone(&engine));
        let cancel = scheduler_cancel.clone();
        Some(tokio::spawn(async move {
            scheduler.run(cancel).await;
        }))
    } else {
        tracing::info!("Batch scheduler disabled (SCHEDULER_ENABLED=false)");
        None
    };

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        registry,
        engine,
    };

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

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    scheduler_cancel.cancel();
    if let Some(handle) = scheduler_handle {
        let timeout = Duration::from_secs(config.shutdown_timeout_secs);
        if tokio::time::timeout(timeout, handle).await.is_err() {
            tracing::warn!("Batch scheduler did not stop within the shutdown timeout");
        } else {
            tracing::info!("Batch scheduler stopped");
        }
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM to initiate graceful shutdown.
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
