//! Run status handlers - the polling surface and cancellation.

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;

use crate::error::HttpError;
use crate::state::AppState;
use evalhub_core::RunOverview;

/// Active runs plus the completed digest.
pub async fn overview(State(state): State<AppState>) -> Result<Json<RunOverview>, HttpError> {
    Ok(Json(state.core.run_status().overview().await?))
}

/// Response for a cancellation request.
#[derive(Serialize)]
pub struct CancelResponse {
    pub success: bool,
}

/// Cancel a test run.
///
/// Bookkeeping only: an in-flight engine invocation is not interrupted.
/// Cancelling an already-terminal run is a no-op that still succeeds.
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CancelResponse>, HttpError> {
    state.core.orchestrator().cancel_run(id).await?;
    Ok(Json(CancelResponse { success: true }))
}
