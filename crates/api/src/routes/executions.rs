use axum::routing::{get, post};
use axum::Router;

use crate::handlers::executions;
use crate::state::AppState;

/// Batch control routes mounted at `/executions`.
///
/// ```text
/// POST   /run       -> run_all
/// GET    /status    -> run_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/run", post(executions::run_all))
        .route("/status", get(executions::run_status))
}
