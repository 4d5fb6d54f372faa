use std::sync::Arc;

use keeper_core::registry::DaoRegistry;
use keeper_pipeline::ExecutionEngine;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything heavy sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (health checks).
    pub pool: keeper_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// DAO registry the HTTP layer writes to and the engine reads from.
    pub registry: Arc<dyn DaoRegistry>,
    /// Proposal execution engine shared with the background scheduler.
    pub engine: Arc<ExecutionEngine>,
}
