//! `SQLite` implementation of the `SystemPromptRepository` trait.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use sqlx::sqlite::SqliteRow;

use evalhub_core::{NewSystemPrompt, RepositoryError, SystemPrompt, SystemPromptRepository};

use super::row_mappers::column_datetime;

/// `SQLite` implementation of the `SystemPromptRepository` trait.
pub struct SqlitePromptRepository {
    pool: SqlitePool,
}

impl SqlitePromptRepository {
    /// Create a new `SQLite` prompt repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_prompt(row: &SqliteRow) -> Result<SystemPrompt, RepositoryError> {
    Ok(SystemPrompt {
        id: row
            .try_get("id")
            .map_err(|e| RepositoryError::Storage(e.to_string()))?,
        name: row
            .try_get("name")
            .map_err(|e| RepositoryError::Storage(e.to_string()))?,
        content: row
            .try_get("content")
            .map_err(|e| RepositoryError::Storage(e.to_string()))?,
        created_at: column_datetime(row, "created_at")?,
    })
}

#[async_trait]
impl SystemPromptRepository for SqlitePromptRepository {
    async fn list(&self) -> Result<Vec<SystemPrompt>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, name, content, created_at FROM system_prompts ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        rows.iter().map(row_to_prompt).collect()
    }

    async fn get(&self, id: i64) -> Result<SystemPrompt, RepositoryError> {
        let row = sqlx::query("SELECT id, name, content, created_at FROM system_prompts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?
            .ok_or_else(|| RepositoryError::NotFound(format!("System prompt with ID {id}")))?;

        row_to_prompt(&row)
    }

    async fn create(&self, prompt: &NewSystemPrompt) -> Result<SystemPrompt, RepositoryError> {
        let result = sqlx::query("INSERT INTO system_prompts (name, content) VALUES (?, ?)")
            .bind(&prompt.name)
            .bind(&prompt.content)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        self.get(result.last_insert_rowid()).await
    }

    async fn update(
        &self,
        id: i64,
        prompt: &NewSystemPrompt,
    ) -> Result<SystemPrompt, RepositoryError> {
        let result = sqlx::query("UPDATE system_prompts SET name = ?, content = ? WHERE id = ?")
            .bind(&prompt.name)
            .bind(&prompt.content)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!(
                "System prompt with ID {id}"
            )));
        }

        self.get(id).await
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM system_prompts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!(
                "System prompt with ID {id}"
            )));
        }

        Ok(())
    }
}
