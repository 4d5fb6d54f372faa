//! Handlers for the DAO registry and the on-demand execution trigger.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use keeper_core::address::is_valid_address;
use keeper_core::error::CoreError;
use keeper_core::execution::ExecutionError;
use keeper_db::models::dao::CreateDao;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/daos
///
/// Every registration, oldest first (the order batch runs visit them).
pub async fn list_daos(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let daos = state.registry.list_all().await?;

    Ok(Json(DataResponse { data: daos }))
}

/// POST /api/v1/daos
///
/// Register a Governor address. The address is stored lowercased.
pub async fn create_dao(
    State(state): State<AppState>,
    Json(input): Json<CreateDao>,
) -> AppResult<impl IntoResponse> {
    let dao = state.registry.add(&input.address).await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: dao })))
}

/// GET /api/v1/daos/{address}
pub async fn get_dao(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> AppResult<impl IntoResponse> {
    let dao = state
        .registry
        .find_by_address(&address)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "DAO",
            id: address,
        }))?;

    Ok(Json(DataResponse { data: dao }))
}

/// POST /api/v1/daos/{address}/execute
///
/// Resolve and execute the newest executable proposal of a registered DAO.
/// Blocks until the transaction is confirmed or fails.
///
/// The pipeline runs on its own task so a client that disconnects mid-wait
/// does not abandon a broadcast transaction; its outcome is still logged.
pub async fn execute_dao(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> AppResult<impl IntoResponse> {
    if !is_valid_address(&address) {
        return Err(ExecutionError::InvalidAddress.into());
    }
    let dao = state
        .registry
        .find_by_address(&address)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "DAO",
            id: address,
        }))?;

    let engine = Arc::clone(&state.engine);
    let task = tokio::spawn(async move {
        let outcome = engine.trigger_execution_for_one(&dao.address).await;
        match &outcome {
            Ok(result) => tracing::info!(
                dao = %dao.address,
                proposal_id = %result.proposal_id,
                tx_hash = %result.transaction_hash,
                "On-demand execution succeeded"
            ),
            Err(e) => tracing::warn!(
                dao = %dao.address,
                code = e.code(),
                error = %e,
                "On-demand execution failed"
            ),
        }
        outcome
    });

    let result = task
        .await
        .map_err(|e| CoreError::Internal(format!("On-demand execution task failed: {e}")))??;

    Ok(Json(DataResponse { data: result }))
}
