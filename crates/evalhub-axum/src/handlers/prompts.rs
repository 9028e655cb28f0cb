//! System prompt handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::error::HttpError;
use crate::state::AppState;
use evalhub_core::{NewSystemPrompt, SystemPrompt};

/// List all system prompts.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<SystemPrompt>>, HttpError> {
    Ok(Json(state.core.prompts().list().await?))
}

/// Get a system prompt by ID.
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SystemPrompt>, HttpError> {
    Ok(Json(state.core.prompts().get(id).await?))
}

/// Create a system prompt.
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<NewSystemPrompt>,
) -> Result<(StatusCode, Json<SystemPrompt>), HttpError> {
    let prompt = state.core.prompts().create(req).await?;
    Ok((StatusCode::CREATED, Json(prompt)))
}

/// Update a system prompt.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<NewSystemPrompt>,
) -> Result<Json<SystemPrompt>, HttpError> {
    Ok(Json(state.core.prompts().update(id, req).await?))
}

/// Delete a system prompt.
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, HttpError> {
    state.core.prompts().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
