use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use keeper_core::error::CoreError;
use keeper_core::execution::ExecutionError;
use keeper_pipeline::BatchError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for registry errors and [`ExecutionError`] for
/// pipeline outcomes. Implements [`IntoResponse`] to produce consistent
/// JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `keeper_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A typed failure from the resolve-and-execute pipeline.
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// A batch run could not be started.
    #[error(transparent)]
    Batch(#[from] BatchError),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => classify_core_error(core),

            // --- Pipeline outcomes (message surfaced verbatim) ---
            AppError::Execution(err) => (execution_status(err), err.code(), err.to_string()),

            // --- Batch control ---
            AppError::Batch(BatchError::AlreadyRunning) => (
                StatusCode::CONFLICT,
                "RUN_IN_PROGRESS",
                self.to_string(),
            ),
            AppError::Batch(BatchError::Registry(core)) => classify_core_error(core),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn classify_core_error(core: &CoreError) -> (StatusCode, &'static str, String) {
    match core {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

/// HTTP status for each pipeline failure kind.
pub fn execution_status(err: &ExecutionError) -> StatusCode {
    match err {
        ExecutionError::InvalidAddress => StatusCode::BAD_REQUEST,
        ExecutionError::NoProposalsFound => StatusCode::NOT_FOUND,
        ExecutionError::NoExecutableProposal => StatusCode::CONFLICT,
        ExecutionError::ExecutionFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ExecutionError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
        ExecutionError::Transport(_) => StatusCode::BAD_GATEWAY,
        ExecutionError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
    }
}
