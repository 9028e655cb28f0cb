//! Result handlers - read access to scored results.

use axum::Json;
use axum::extract::{Path, State};

use crate::error::HttpError;
use crate::state::AppState;
use evalhub_core::TestResult;

/// List all test results, newest first.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<TestResult>>, HttpError> {
    Ok(Json(state.core.results().list().await?))
}

/// Get details for a specific test result.
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TestResult>, HttpError> {
    Ok(Json(state.core.results().get(id).await?))
}
