//! Route definitions for the DAO registry.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::daos;
use crate::state::AppState;

/// Registry routes mounted at `/daos`.
///
/// ```text
/// GET    /                      -> list_daos
/// POST   /                      -> create_dao
/// GET    /{address}             -> get_dao
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(daos::list_daos).post(daos::create_dao))
        .route("/{address}", get(daos::get_dao))
}

/// On-demand execution, mounted at `/daos` outside the request timeout.
///
/// ```text
/// POST   /{address}/execute     -> execute_dao
/// ```
pub fn execute_router() -> Router<AppState> {
    Router::new().route("/{address}/execute", post(daos::execute_dao))
}
