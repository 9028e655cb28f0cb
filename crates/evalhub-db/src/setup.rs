//! Database setup and initialization.
//!
//! This module provides the `setup_database()` function for initializing
//! the `SQLite` database with full schema. Entry points call this with
//! the resolved database path.

use anyhow::Result;
use sqlx::{SqlitePool, sqlite::SqliteConnectOptions};
use std::path::Path;

/// Sets up the `SQLite` database connection and ensures the schema exists.
///
/// Creates the database file if it doesn't exist, then creates all
/// tables and indexes. Safe to call repeatedly.
///
/// # Errors
///
/// Returns an error if the database file cannot be opened or created,
/// or if schema creation fails.
pub async fn setup_database(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let pool = SqlitePool::connect_with(
        SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true),
    )
    .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Sets up an in-memory `SQLite` database for testing.
///
/// Creates a fresh in-memory database with the full production schema.
#[cfg(any(test, feature = "test-utils"))]
pub async fn setup_test_database() -> Result<SqlitePool> {
    use sqlx::sqlite::SqlitePoolOptions;

    // One shared connection: every in-memory connection is its own database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    create_schema(&pool).await?;
    Ok(pool)
}

/// Creates the complete database schema.
///
/// This function creates all tables and indexes required by the
/// application. It is safe to call multiple times as all operations use
/// IF NOT EXISTS.
async fn create_schema(pool: &SqlitePool) -> Result<()> {
    // Reusable system prompts, referenced by modules and test cases
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS system_prompts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            content TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Evaluation modules
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS modules (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT,
            purpose TEXT,
            relevance TEXT,
            system_prompt_id INTEGER,
            FOREIGN KEY (system_prompt_id) REFERENCES system_prompts(id) ON DELETE SET NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Grading-method assignments (set semantics per module)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS module_grading_methods (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            module_id INTEGER NOT NULL,
            grading_method TEXT NOT NULL
                CHECK (grading_method IN ('BLEU', 'ROUGE', 'METEOR', 'LLM_JUDGE')),
            FOREIGN KEY (module_id) REFERENCES modules(id) ON DELETE CASCADE,
            UNIQUE(module_id, grading_method)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Test cases owned by modules
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS test_cases (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            module_id INTEGER NOT NULL,
            input TEXT NOT NULL,
            reference_response TEXT NOT NULL,
            system_prompt_id INTEGER,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            FOREIGN KEY (module_id) REFERENCES modules(id) ON DELETE CASCADE,
            FOREIGN KEY (system_prompt_id) REFERENCES system_prompts(id) ON DELETE SET NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_test_cases_module ON test_cases(module_id)")
        .execute(pool)
        .await?;

    // Model registrations
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS models (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            type TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            config TEXT NOT NULL DEFAULT '{}'
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Encrypted API keys, one record per model
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS model_api_keys (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            model_id INTEGER NOT NULL UNIQUE,
            encrypted_key TEXT NOT NULL DEFAULT '',
            iv TEXT NOT NULL DEFAULT '',
            FOREIGN KEY (model_id) REFERENCES models(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Test runs: intent/status rows. No foreign keys - runs are
    // historical records and outlive test case edits and deletions
    // (status views LEFT JOIN accordingly).
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS test_runs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            test_case_id INTEGER NOT NULL,
            grading_method TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'running', 'completed', 'failed')),
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_test_runs_status ON test_runs(status)")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_test_runs_case_method ON test_runs(test_case_id, grading_method)",
    )
    .execute(pool)
    .await?;

    // Test results: outcome rows with dispatch-time snapshots
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS test_results (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            test_case_id INTEGER NOT NULL,
            module_id INTEGER NOT NULL,
            model_implementation TEXT NOT NULL,
            model_name TEXT NOT NULL,
            prompt TEXT NOT NULL,
            model_response TEXT NOT NULL,
            reference_response TEXT NOT NULL,
            grading_method TEXT NOT NULL,
            overall_score REAL NOT NULL,
            attribute_scores TEXT NOT NULL DEFAULT '{}',
            system_prompt_id INTEGER,
            system_prompt_content TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_test_results_created ON test_results(created_at)")
        .execute(pool)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_setup_test_database() {
        let pool = setup_test_database().await.unwrap();

        // Verify tables exist by querying them
        let _: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM modules")
            .fetch_one(&pool)
            .await
            .unwrap();

        let _: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM test_runs")
            .fetch_one(&pool)
            .await
            .unwrap();

        let _: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM test_results")
            .fetch_one(&pool)
            .await
            .unwrap();

        let _: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM model_api_keys")
            .fetch_one(&pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn schema_rejects_unknown_grading_methods() {
        let pool = setup_test_database().await.unwrap();

        sqlx::query("INSERT INTO modules (name) VALUES ('m')")
            .execute(&pool)
            .await
            .unwrap();

        let err = sqlx::query(
            "INSERT INTO module_grading_methods (module_id, grading_method) VALUES (1, 'EXACT')",
        )
        .execute(&pool)
        .await;
        assert!(err.is_err());
    }
}
