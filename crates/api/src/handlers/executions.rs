//! Handlers for batch run control.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use keeper_core::scheduling::RunState;
use serde::Serialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RunStatus {
    pub state: RunState,
}

/// POST /api/v1/executions/run
///
/// Start a batch over every registered DAO in the background. Responds
/// 202 immediately; 409 when a run (scheduled or manual) is in progress.
pub async fn run_all(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let guard = state.engine.try_start_run()?;
    let engine = Arc::clone(&state.engine);
    tokio::spawn(async move {
        if let Err(e) = engine.run_batch(guard).await {
            tracing::warn!(error = %e, "Manual batch run aborted");
        }
    });

    tracing::info!("Manual batch run started");

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: RunStatus {
                state: RunState::Running,
            },
        }),
    ))
}

/// GET /api/v1/executions/status
pub async fn run_status(State(state): State<AppState>) -> Json<DataResponse<RunStatus>> {
    Json(DataResponse {
        data: RunStatus {
            state: state.engine.run_state(),
        },
    })
}
