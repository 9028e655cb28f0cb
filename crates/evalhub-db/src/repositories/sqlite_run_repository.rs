//! `SQLite` implementation of the `RunRepository` trait.
//!
//! Owns the two transactional write units of the orchestrator: the
//! all-or-nothing batch insert at run creation, and the atomic
//! completions-plus-results write at reconciliation. Status transitions
//! are guarded in SQL so a terminal row can never be resurrected.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use evalhub_core::{
    ActiveRun, CompletedEvaluation, CompletedRunGroup, NewTestResult, NewTestRun,
    RepositoryError, RunRepository, RunStatus, TestRun,
};

use super::row_mappers::{
    column_datetime, parse_run_status, placeholders, row_to_active_run, row_to_test_run,
};

/// `SQLite` implementation of the `RunRepository` trait.
pub struct SqliteRunRepository {
    pool: SqlitePool,
}

impl SqliteRunRepository {
    /// Create a new `SQLite` run repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

async fn insert_test_result(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    result: &NewTestResult,
) -> Result<(), RepositoryError> {
    let attribute_scores = serde_json::to_string(&result.attribute_scores.as_json())
        .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

    sqlx::query(
        r#"INSERT INTO test_results
            (test_case_id, module_id, model_implementation, model_name,
             prompt, model_response, reference_response, grading_method,
             overall_score, attribute_scores, system_prompt_id, system_prompt_content)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(result.test_case_id)
    .bind(result.module_id)
    .bind(&result.model_implementation)
    .bind(&result.model_name)
    .bind(&result.prompt)
    .bind(&result.model_response)
    .bind(&result.reference_response)
    .bind(result.grading_method.as_str())
    .bind(result.overall_score)
    .bind(&attribute_scores)
    .bind(result.system_prompt_id)
    .bind(&result.system_prompt_content)
    .execute(&mut **tx)
    .await
    .map_err(|e| RepositoryError::Storage(e.to_string()))?;

    Ok(())
}

#[async_trait]
impl RunRepository for SqliteRunRepository {
    async fn create_batch(&self, entries: &[NewTestRun]) -> Result<Vec<i64>, RepositoryError> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        let mut ids = Vec::with_capacity(entries.len());
        for entry in entries {
            let result = sqlx::query(
                "INSERT INTO test_runs (test_case_id, grading_method, status) VALUES (?, ?, 'pending')",
            )
            .bind(entry.test_case_id)
            .bind(entry.grading_method.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

            ids.push(result.last_insert_rowid());
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        Ok(ids)
    }

    async fn mark_running(&self, run_ids: &[i64]) -> Result<(), RepositoryError> {
        if run_ids.is_empty() {
            return Ok(());
        }

        let query = format!(
            "UPDATE test_runs SET status = 'running', updated_at = datetime('now')
             WHERE status = 'pending' AND id IN ({})",
            placeholders(run_ids.len())
        );

        let mut q = sqlx::query(&query);
        for id in run_ids {
            q = q.bind(id);
        }
        q.execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn complete_batch(
        &self,
        run_ids: &[i64],
        completions: &[CompletedEvaluation],
    ) -> Result<(), RepositoryError> {
        if run_ids.is_empty() || completions.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        let update = format!(
            "UPDATE test_runs SET status = 'completed', updated_at = datetime('now')
             WHERE test_case_id = ? AND grading_method = ? AND status = 'running'
               AND id IN ({})",
            placeholders(run_ids.len())
        );

        for completion in completions {
            let mut q = sqlx::query(&update)
                .bind(completion.test_case_id)
                .bind(completion.grading_method.as_str());
            for id in run_ids {
                q = q.bind(id);
            }
            let updated = q
                .execute(&mut *tx)
                .await
                .map_err(|e| RepositoryError::Storage(e.to_string()))?;

            // A pair that is no longer `running` (cancelled mid-flight)
            // keeps its terminal state and gets no result row.
            if updated.rows_affected() > 0 {
                insert_test_result(&mut tx, &completion.result).await?;
            }
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn fail_unresolved(&self, run_ids: &[i64]) -> Result<u64, RepositoryError> {
        if run_ids.is_empty() {
            return Ok(0);
        }

        let query = format!(
            "UPDATE test_runs SET status = 'failed', updated_at = datetime('now')
             WHERE status IN ('pending', 'running') AND id IN ({})",
            placeholders(run_ids.len())
        );

        let mut q = sqlx::query(&query);
        for id in run_ids {
            q = q.bind(id);
        }
        let result = q
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn cancel(&self, run_id: i64) -> Result<RunStatus, RepositoryError> {
        sqlx::query(
            "UPDATE test_runs SET status = 'failed', updated_at = datetime('now')
             WHERE id = ? AND status IN ('pending', 'running')",
        )
        .bind(run_id)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        let row = sqlx::query("SELECT status FROM test_runs WHERE id = ?")
            .bind(run_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?
            .ok_or_else(|| RepositoryError::NotFound(format!("Test run with ID {run_id}")))?;

        let status: String = row
            .try_get("status")
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;
        parse_run_status(&status)
    }

    async fn get(&self, run_id: i64) -> Result<TestRun, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, test_case_id, grading_method, status, created_at, updated_at
             FROM test_runs WHERE id = ?",
        )
        .bind(run_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Storage(e.to_string()))?
        .ok_or_else(|| RepositoryError::NotFound(format!("Test run with ID {run_id}")))?;

        row_to_test_run(&row)
    }

    async fn list_active(&self) -> Result<Vec<ActiveRun>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT tr.id, tr.test_case_id, tr.grading_method, tr.status,
                   tr.created_at, tr.updated_at,
                   tc.input, tc.module_id,
                   m.name AS module_name, m.description AS module_description
            FROM test_runs tr
            LEFT JOIN test_cases tc ON tr.test_case_id = tc.id
            LEFT JOIN modules m ON tc.module_id = m.id
            WHERE tr.status IN ('pending', 'running')
            ORDER BY
                CASE tr.status
                    WHEN 'running' THEN 1
                    WHEN 'pending' THEN 2
                END,
                tr.created_at DESC,
                tr.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        rows.iter().map(row_to_active_run).collect()
    }

    async fn completed_digest(
        &self,
        limit: u32,
    ) -> Result<Vec<CompletedRunGroup>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT m.id AS module_id, m.name AS module_name,
                   strftime('%Y-%m-%d %H:%M:00', tr.updated_at) AS completion_time,
                   COUNT(DISTINCT tr.test_case_id) AS test_case_count,
                   GROUP_CONCAT(DISTINCT tr.grading_method) AS grading_methods,
                   tr.status,
                   MIN(tr.created_at) AS created_at,
                   MAX(tr.updated_at) AS updated_at
            FROM test_runs tr
            LEFT JOIN test_cases tc ON tr.test_case_id = tc.id
            LEFT JOIN modules m ON tc.module_id = m.id
            WHERE tr.status IN ('completed', 'failed')
            GROUP BY m.id, m.name, strftime('%Y-%m-%d %H:%M:00', tr.updated_at), tr.status
            ORDER BY MAX(tr.updated_at) DESC
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        rows.iter()
            .map(|row| {
                let status: String = row
                    .try_get("status")
                    .map_err(|e| RepositoryError::Storage(e.to_string()))?;
                let methods_raw: Option<String> = row
                    .try_get("grading_methods")
                    .map_err(|e| RepositoryError::Storage(e.to_string()))?;
                let grading_methods = methods_raw
                    .as_deref()
                    .unwrap_or_default()
                    .split(',')
                    .filter_map(evalhub_core::GradingMethod::parse)
                    .collect();

                Ok(CompletedRunGroup {
                    module_id: row.try_get("module_id").ok().flatten(),
                    module_name: row.try_get("module_name").ok().flatten(),
                    completion_time: row
                        .try_get::<Option<String>, _>("completion_time")
                        .ok()
                        .flatten()
                        .unwrap_or_default(),
                    test_case_count: row
                        .try_get("test_case_count")
                        .map_err(|e| RepositoryError::Storage(e.to_string()))?,
                    grading_methods,
                    status: parse_run_status(&status)?,
                    created_at: column_datetime(row, "created_at")?,
                    updated_at: column_datetime(row, "updated_at")?,
                })
            })
            .collect()
    }
}
