pub mod daos;
pub mod executions;
pub mod health;

use std::time::Duration;

use axum::Router;

use crate::router::request_timeout_layer;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /daos                          list, register
/// /daos/{address}                get registration
/// /daos/{address}/execute        execute newest executable proposal (POST)
///
/// /executions/run                start a batch over all DAOs (POST)
/// /executions/status             idle | running
/// ```
///
/// Everything except `/daos/{address}/execute` is cut off after
/// `request_timeout`.
pub fn api_routes(request_timeout: Duration) -> Router<AppState> {
    Router::new()
        .nest("/daos", daos::router())
        .nest("/executions", executions::router())
        .layer(request_timeout_layer(request_timeout))
        .nest("/daos", daos::execute_router())
}
