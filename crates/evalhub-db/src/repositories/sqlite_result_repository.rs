//! `SQLite` implementation of the `ResultRepository` trait.
//!
//! Read-only: result rows are inserted by `SqliteRunRepository` inside
//! the reconciliation transaction.

use async_trait::async_trait;
use sqlx::SqlitePool;

use evalhub_core::{RepositoryError, ResultRepository, TestResult};

use super::row_mappers::row_to_test_result;

const RESULT_SELECT: &str = r#"
    SELECT tr.id, tr.test_case_id, tr.module_id, tr.model_implementation,
           tr.model_name, tr.prompt, tr.model_response, tr.reference_response,
           tr.grading_method, tr.overall_score, tr.attribute_scores,
           tr.system_prompt_id, tr.system_prompt_content, tr.created_at,
           m.name AS module_name,
           sp.name AS system_prompt_name
    FROM test_results tr
    LEFT JOIN modules m ON tr.module_id = m.id
    LEFT JOIN system_prompts sp ON tr.system_prompt_id = sp.id
"#;

/// `SQLite` implementation of the `ResultRepository` trait.
pub struct SqliteResultRepository {
    pool: SqlitePool,
}

impl SqliteResultRepository {
    /// Create a new `SQLite` result repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResultRepository for SqliteResultRepository {
    async fn list(&self) -> Result<Vec<TestResult>, RepositoryError> {
        let query = format!("{RESULT_SELECT} ORDER BY tr.created_at DESC, tr.id DESC");

        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        rows.iter().map(row_to_test_result).collect()
    }

    async fn get(&self, id: i64) -> Result<TestResult, RepositoryError> {
        let query = format!("{RESULT_SELECT} WHERE tr.id = ?");

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?
            .ok_or_else(|| RepositoryError::NotFound(format!("Test result with ID {id}")))?;

        row_to_test_result(&row)
    }
}
