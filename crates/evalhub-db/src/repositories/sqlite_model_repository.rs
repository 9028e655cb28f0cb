//! `SQLite` implementation of the `ModelRepository` trait.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use sqlx::sqlite::SqliteRow;

use evalhub_core::{
    ApiKeyRecord, ModelRegistration, ModelRepository, NewModelRegistration, RepositoryError,
};

/// `SQLite` implementation of the `ModelRepository` trait.
///
/// Key records are stored as opaque base64 text; this repository never
/// sees plaintext keys.
pub struct SqliteModelRepository {
    pool: SqlitePool,
}

impl SqliteModelRepository {
    /// Create a new `SQLite` model repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_registration(row: &SqliteRow) -> Result<ModelRegistration, RepositoryError> {
    let config_raw: String = row
        .try_get("config")
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

    Ok(ModelRegistration {
        id: row
            .try_get("id")
            .map_err(|e| RepositoryError::Storage(e.to_string()))?,
        name: row
            .try_get("name")
            .map_err(|e| RepositoryError::Storage(e.to_string()))?,
        kind: row
            .try_get("type")
            .map_err(|e| RepositoryError::Storage(e.to_string()))?,
        description: row
            .try_get("description")
            .map_err(|e| RepositoryError::Storage(e.to_string()))?,
        config: serde_json::from_str(&config_raw).unwrap_or_default(),
    })
}

const MODEL_SELECT_COLUMNS: &str = "id, name, type, description, config";

#[async_trait]
impl ModelRepository for SqliteModelRepository {
    async fn list(&self) -> Result<Vec<ModelRegistration>, RepositoryError> {
        let query = format!("SELECT {MODEL_SELECT_COLUMNS} FROM models ORDER BY name");

        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        rows.iter().map(row_to_registration).collect()
    }

    async fn get_by_name(&self, name: &str) -> Result<ModelRegistration, RepositoryError> {
        let query = format!("SELECT {MODEL_SELECT_COLUMNS} FROM models WHERE name = ?");

        let row = sqlx::query(&query)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?
            .ok_or_else(|| RepositoryError::NotFound(format!("Model with name '{name}'")))?;

        row_to_registration(&row)
    }

    async fn upsert(
        &self,
        registration: &NewModelRegistration,
    ) -> Result<ModelRegistration, RepositoryError> {
        let config_json = serde_json::to_string(&registration.config)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        sqlx::query(
            r#"INSERT INTO models (name, type, description, config)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET
                type = excluded.type,
                description = excluded.description,
                config = excluded.config
            "#,
        )
        .bind(&registration.name)
        .bind(&registration.kind)
        .bind(&registration.description)
        .bind(&config_json)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        // Seed an empty key record so the UI can track key status
        sqlx::query(
            r#"INSERT OR IGNORE INTO model_api_keys (model_id, encrypted_key, iv)
            SELECT id, '', '' FROM models WHERE name = ?
            "#,
        )
        .bind(&registration.name)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        self.get_by_name(&registration.name).await
    }

    async fn api_key(&self, model_id: i64) -> Result<Option<ApiKeyRecord>, RepositoryError> {
        let row = sqlx::query("SELECT encrypted_key, iv FROM model_api_keys WHERE model_id = ?")
            .bind(model_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        row.map(|row| {
            Ok(ApiKeyRecord {
                encrypted_key: row
                    .try_get("encrypted_key")
                    .map_err(|e| RepositoryError::Storage(e.to_string()))?,
                iv: row
                    .try_get("iv")
                    .map_err(|e| RepositoryError::Storage(e.to_string()))?,
            })
        })
        .transpose()
    }

    async fn store_api_key(
        &self,
        model_id: i64,
        record: &ApiKeyRecord,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO model_api_keys (model_id, encrypted_key, iv)
            VALUES (?, ?, ?)
            ON CONFLICT(model_id) DO UPDATE SET
                encrypted_key = excluded.encrypted_key,
                iv = excluded.iv
            "#,
        )
        .bind(model_id)
        .bind(&record.encrypted_key)
        .bind(&record.iv)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                RepositoryError::NotFound(format!("Model with ID {model_id}"))
            }
            _ => RepositoryError::Storage(e.to_string()),
        })?;

        Ok(())
    }
}
