//! CLI entry point - the composition root.
//!
//! Command dispatch routes to the Axum bootstrap; all infrastructure
//! wiring happens there. Configuration comes from flags with env-var
//! fallbacks (`.env` is loaded first via dotenvy).

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use evalhub_axum::{CorsConfig, ServerConfig, start_server};
use evalhub_engine::EngineConfig;

/// Environment variable holding the key-vault master secret.
const MASTER_KEY_ENV: &str = "EVALHUB_MASTER_KEY";

#[derive(Parser)]
#[command(name = "evalhub", about = "LLM evaluation admin server", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server.
    Serve {
        /// Port to listen on.
        #[arg(long, default_value_t = 9800)]
        port: u16,

        /// Path to the SQLite database file.
        #[arg(long, default_value = "data/evalhub.db")]
        db: PathBuf,

        /// Evaluation engine program (e.g. the evaluation venv's python).
        #[arg(long, default_value = "python3")]
        engine: PathBuf,

        /// Arguments passed to the engine program, typically the runner
        /// script path. Repeatable.
        #[arg(long = "engine-arg", default_value = "llm_evaluation/run_tests.py")]
        engine_args: Vec<String>,

        /// Working directory for the engine process.
        #[arg(long)]
        engine_dir: Option<PathBuf>,

        /// Directory with the built admin UI; omit for API-only mode.
        #[arg(long)]
        static_dir: Option<PathBuf>,

        /// Allowed CORS origins; omit to allow all (development mode).
        #[arg(long = "allow-origin")]
        allow_origins: Vec<String>,
    },

    /// Create the database file and schema, then exit.
    InitDb {
        /// Path to the SQLite database file.
        #[arg(long, default_value = "data/evalhub.db")]
        db: PathBuf,
    },
}

fn master_key() -> Result<String> {
    match std::env::var(MASTER_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => bail!(
            "{MASTER_KEY_ENV} must be set - it protects the stored model API keys. \
             Set it in the environment or in .env"
        ),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            port,
            db,
            engine,
            engine_args,
            engine_dir,
            static_dir,
            allow_origins,
        } => {
            let mut engine_config = EngineConfig::new(engine).with_args(engine_args);
            if let Some(dir) = engine_dir {
                engine_config = engine_config.with_working_dir(dir);
            }

            let cors = if allow_origins.is_empty() {
                CorsConfig::AllowAll
            } else {
                CorsConfig::AllowOrigins(allow_origins)
            };

            let config = ServerConfig {
                port,
                db_path: db,
                engine: engine_config,
                master_key: master_key()?,
                static_dir,
                cors,
            };

            start_server(config).await
        }
        Commands::InitDb { db } => {
            let pool = evalhub_db::setup_database(&db)
                .await
                .with_context(|| format!("failed to initialize {}", db.display()))?;
            pool.close().await;
            tracing::info!(path = %db.display(), "database initialized");
            Ok(())
        }
    }
}
