//! Headless batch scheduler.
//!
//! Runs the same schedule as the API server's background scheduler, for
//! deployments that keep execution out of the HTTP process (start the API
//! with `SCHEDULER_ENABLED=false`).

use std::sync::Arc;

use keeper_core::registry::DaoRegistry;
use keeper_db::PgDaoRegistry;
use keeper_pipeline::EngineConfig;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "keeper_worker=debug,keeper_pipeline=debug,keeper_chain=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let engine_config = EngineConfig::from_env();
    tracing::info!(config = ?engine_config, "Loaded engine configuration");

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = keeper_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    keeper_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready");

    let registry: Arc<dyn DaoRegistry> = Arc::new(PgDaoRegistry::new(pool));
    let engine = Arc::new(engine_config.build_engine(registry));
    let scheduler = engine_config.build_scheduler(engine);

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received SIGINT (Ctrl-C), stopping scheduler"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C, stopping scheduler")
            }
        }
        shutdown.cancel();
    });

    scheduler.run(cancel).await;
    tracing::info!("Worker stopped");
}
