//! Axum server bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together
//! for the web adapter. All concrete implementations are instantiated
//! here.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use evalhub_core::services::{AppCore, KeyVault};
use evalhub_db::{CoreFactory, setup_database};
use evalhub_engine::{EngineConfig, SubprocessEngine};

/// CORS configuration for the web server.
#[derive(Debug, Clone, Default)]
pub enum CorsConfig {
    /// Allow all origins (development mode).
    #[default]
    AllowAll,
    /// Allow specific origins (production mode).
    AllowOrigins(Vec<String>),
}

/// Server configuration for the Axum adapter.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port for the HTTP server.
    pub port: u16,
    /// Path to the `SQLite` database file.
    pub db_path: PathBuf,
    /// Evaluation engine invocation.
    pub engine: EngineConfig,
    /// Master secret for the API key vault.
    pub master_key: String,
    /// Optional path to static assets for SPA serving.
    pub static_dir: Option<PathBuf>,
    /// CORS configuration.
    pub cors: CorsConfig,
}

impl ServerConfig {
    /// Set the static directory for SPA serving.
    #[must_use]
    pub fn with_static_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(path.into());
        self
    }

    /// Set CORS to allow specific origins.
    #[must_use]
    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.cors = CorsConfig::AllowOrigins(origins);
        self
    }
}

/// Application context for the Axum adapter.
///
/// This struct holds the composed services for the web server.
pub struct AxumContext {
    /// The core application facade.
    pub core: Arc<AppCore>,
}

/// Bootstrap the Axum server with all services.
pub async fn bootstrap(config: ServerConfig) -> Result<AxumContext> {
    tracing::info!(
        database_path = %config.db_path.display(),
        engine = %config.engine.program.display(),
        "axum bootstrap resolved paths"
    );

    // 1. Create database pool with full schema setup
    let pool = setup_database(&config.db_path).await?;

    // 2. Create the evaluation engine adapter and the key vault
    let engine = Arc::new(SubprocessEngine::new(config.engine.clone()));
    let vault = Arc::new(KeyVault::from_master_secret(&config.master_key));

    // 3. Assemble AppCore
    let core = Arc::new(CoreFactory::build_core(pool, engine, vault));

    Ok(AxumContext { core })
}

/// Start the web server on the configured port.
///
/// If `config.static_dir` is set, serves static assets with SPA
/// fallback. Otherwise, serves only the API endpoints.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    use tokio::net::TcpListener;
    use tracing::info;

    let ctx = bootstrap(config.clone()).await?;

    let app = if let Some(ref static_dir) = config.static_dir {
        info!("Serving static assets from: {}", static_dir.display());
        crate::routes::create_spa_router(ctx, static_dir, &config.cors)
    } else {
        crate::routes::create_router(ctx, &config.cors)
    };

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;

    if config.static_dir.is_some() {
        info!("evalhub web server (with UI) listening on http://{addr}");
    } else {
        info!("evalhub web server (API only) listening on http://{addr}");
    }

    axum::serve(listener, app).await?;
    Ok(())
}
