//! Route definitions and router construction.
//!
//! This module defines the HTTP routes and creates the main router.
//! Handlers delegate to the shared `AppCore`.

use axum::Router;
use axum::routing::{get, post};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};

use crate::bootstrap::{AxumContext, CorsConfig};
use crate::handlers;
use crate::state::AppState;

/// Build CORS layer from configuration.
fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    match config {
        CorsConfig::AllowAll => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        CorsConfig::AllowOrigins(origins) => {
            use axum::http::HeaderValue;
            let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}

/// Build all API routes without the `/api` prefix (for nesting).
///
/// Returns a router typed as `Router<AppState>` WITHOUT `.with_state()`
/// applied; the caller applies state before nesting under `/api`.
pub(crate) fn api_routes() -> Router<AppState> {
    Router::new()
        // Modules API
        .route(
            "/modules",
            get(handlers::modules::list).post(handlers::modules::create),
        )
        .route(
            "/modules/grading-methods",
            get(handlers::modules::grading_methods),
        )
        .route(
            "/modules/{id}",
            get(handlers::modules::get)
                .put(handlers::modules::update)
                .delete(handlers::modules::remove),
        )
        .route(
            "/modules/{id}/test-cases",
            get(handlers::modules::list_test_cases).post(handlers::modules::add_test_case),
        )
        .route(
            "/modules/{id}/test-cases/{test_case_id}",
            axum::routing::delete(handlers::modules::remove_test_case),
        )
        .route("/modules/{id}/run-tests", post(handlers::modules::run_tests))
        // Runs API (status polling + cancellation)
        .route("/runs", get(handlers::runs::overview))
        .route("/runs/{id}/cancel", post(handlers::runs::cancel))
        // Results API
        .route("/results", get(handlers::results::list))
        .route("/results/{id}", get(handlers::results::get))
        // Models API
        .route(
            "/models",
            get(handlers::models::list).post(handlers::models::register),
        )
        .route(
            "/models/{name}/api-key",
            get(handlers::models::get_api_key).post(handlers::models::store_api_key),
        )
        // System prompts API
        .route(
            "/system-prompts",
            get(handlers::prompts::list).post(handlers::prompts::create),
        )
        .route(
            "/system-prompts/{id}",
            get(handlers::prompts::get)
                .put(handlers::prompts::update)
                .delete(handlers::prompts::remove),
        )
}

/// Create the main Axum router with all API routes.
///
/// # Path Parameter Syntax
/// Axum 0.8 uses brace syntax for path parameters: `{id}`, `{name}`
pub fn create_router(ctx: AxumContext, cors_config: &CorsConfig) -> Router {
    let state: AppState = Arc::new(ctx);
    let cors = build_cors_layer(cors_config);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes().with_state(state).layer(cors))
}

/// Create a router with API routes and static asset serving.
///
/// Serves the built admin UI from `static_dir` with an SPA fallback to
/// `index.html` for client-side routing; API routes take priority.
pub fn create_spa_router<P: AsRef<Path>>(
    ctx: AxumContext,
    static_dir: P,
    cors_config: &CorsConfig,
) -> Router {
    let static_path = static_dir.as_ref();
    let index_path = static_path.join("index.html");

    let serve_dir = ServeDir::new(static_path).fallback(ServeFile::new(&index_path));

    let api = create_router(ctx, cors_config);
    api.fallback_service(serve_dir)
}

/// Health check endpoint.
pub(crate) async fn health_check() -> &'static str {
    "OK"
}
