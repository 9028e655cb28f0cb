//! Model registry handlers - registrations and API key management.

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use crate::error::HttpError;
use crate::state::AppState;
use evalhub_core::{ModelRegistration, NewModelRegistration};

/// List all registered models.
pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<Vec<ModelRegistration>>, HttpError> {
    Ok(Json(state.core.models().list().await?))
}

/// Register or refresh a model implementation.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<NewModelRegistration>,
) -> Result<Json<ModelRegistration>, HttpError> {
    Ok(Json(state.core.models().register(req).await?))
}

/// API key payload - request and response share the shape.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyBody {
    pub api_key: Option<String>,
}

/// Store (or clear) a model's API key.
pub async fn store_api_key(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<ApiKeyBody>,
) -> Result<Json<ApiKeyBody>, HttpError> {
    state
        .core
        .models()
        .store_key(&name, req.api_key.as_deref())
        .await?;
    Ok(Json(ApiKeyBody {
        api_key: req.api_key.filter(|k| !k.is_empty()),
    }))
}

/// Fetch a model's decrypted API key.
///
/// This is the one deliberate plaintext egress point, used by the admin
/// key-management screen; the key never appears on any other surface.
pub async fn get_api_key(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ApiKeyBody>, HttpError> {
    let key = state.core.models().fetch_key(&name).await?;
    Ok(Json(ApiKeyBody {
        api_key: key.map(|k| k.expose().to_string()),
    }))
}
