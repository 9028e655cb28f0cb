//! Module handlers - CRUD, test cases, and run creation.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::HttpError;
use crate::state::AppState;
use evalhub_core::{
    GradingMethod, Module, ModuleDetail, ModuleUpdate, NewModule, NewTestCase, RunRequest,
    TestCase,
};

/// List all modules.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Module>>, HttpError> {
    Ok(Json(state.core.modules().list().await?))
}

/// The fixed set of grading methods, for UI pickers.
pub async fn grading_methods() -> Json<Vec<&'static str>> {
    Json(GradingMethod::ALL.iter().map(GradingMethod::as_str).collect())
}

/// Get a single module with test cases and grading methods.
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ModuleDetail>, HttpError> {
    Ok(Json(state.core.modules().get(id).await?))
}

/// Create a new module.
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<NewModule>,
) -> Result<(StatusCode, Json<Module>), HttpError> {
    let module = state.core.modules().create(req).await?;
    Ok((StatusCode::CREATED, Json(module)))
}

/// Update a module, replacing its grading-method set.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<ModuleUpdate>,
) -> Result<Json<Module>, HttpError> {
    Ok(Json(state.core.modules().update(id, req).await?))
}

/// Delete a module and its test cases.
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, HttpError> {
    state.core.modules().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List a module's test cases.
pub async fn list_test_cases(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<TestCase>>, HttpError> {
    Ok(Json(state.core.modules().list_test_cases(id).await?))
}

/// Add a test case to a module.
pub async fn add_test_case(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<NewTestCase>,
) -> Result<(StatusCode, Json<TestCase>), HttpError> {
    let test_case = state.core.modules().add_test_case(id, req).await?;
    Ok((StatusCode::CREATED, Json(test_case)))
}

/// Remove a test case from a module.
pub async fn remove_test_case(
    State(state): State<AppState>,
    Path((id, test_case_id)): Path<(i64, i64)>,
) -> Result<StatusCode, HttpError> {
    state
        .core
        .modules()
        .remove_test_case(id, test_case_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Request body for running a module's tests.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunTestsRequest {
    /// Subset of the module's test cases; omitted means all of them.
    #[serde(default)]
    pub test_case_ids: Option<Vec<i64>>,
    pub implementation: String,
    pub model: String,
}

/// Response for a queued run batch.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunTestsResponse {
    pub success: bool,
    pub message: String,
    pub test_run_ids: Vec<i64>,
}

/// Queue test runs for a module.
///
/// Responds as soon as the run batch is committed; evaluation happens
/// on a background task and is observable via `GET /api/runs`.
pub async fn run_tests(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<RunTestsRequest>,
) -> Result<Json<RunTestsResponse>, HttpError> {
    let test_run_ids = state
        .core
        .orchestrator()
        .create_run(RunRequest {
            module_id: id,
            test_case_ids: req.test_case_ids,
            implementation: req.implementation,
            model: req.model,
        })
        .await?;

    Ok(Json(RunTestsResponse {
        success: true,
        message: "Tests queued successfully".to_string(),
        test_run_ids,
    }))
}
