//! `SQLite` implementation of the `ModuleRepository` trait.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use evalhub_core::{
    Module, ModuleDetail, ModuleRepository, ModuleUpdate, NewModule, NewTestCase,
    RepositoryError, ResolvedTestCase, SystemPrompt, TestCase,
};

use super::row_mappers::{column_datetime, parse_grading_method, placeholders};

/// `SQLite` implementation of the `ModuleRepository` trait.
pub struct SqliteModuleRepository {
    pool: SqlitePool,
}

impl SqliteModuleRepository {
    /// Create a new `SQLite` module repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn grading_methods(
        &self,
        module_id: i64,
    ) -> Result<Vec<evalhub_core::GradingMethod>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT grading_method FROM module_grading_methods WHERE module_id = ? ORDER BY grading_method",
        )
        .bind(module_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        rows.iter()
            .map(|row| {
                let raw: String = row
                    .try_get("grading_method")
                    .map_err(|e| RepositoryError::Storage(e.to_string()))?;
                parse_grading_method(&raw)
            })
            .collect()
    }

    async fn module_row(&self, id: i64) -> Result<Module, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, description, purpose, relevance, system_prompt_id FROM modules WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Storage(e.to_string()))?
        .ok_or_else(|| RepositoryError::NotFound(format!("Module with ID {id}")))?;

        Ok(Module {
            id,
            name: row
                .try_get("name")
                .map_err(|e| RepositoryError::Storage(e.to_string()))?,
            description: row.try_get("description").ok().flatten(),
            purpose: row.try_get("purpose").ok().flatten(),
            relevance: row.try_get("relevance").ok().flatten(),
            system_prompt_id: row.try_get("system_prompt_id").ok().flatten(),
            grading_methods: self.grading_methods(id).await?,
        })
    }
}

#[async_trait]
impl ModuleRepository for SqliteModuleRepository {
    async fn list(&self) -> Result<Vec<Module>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, name, description, purpose, relevance, system_prompt_id FROM modules ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        let mut modules = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row
                .try_get("id")
                .map_err(|e| RepositoryError::Storage(e.to_string()))?;
            modules.push(Module {
                id,
                name: row
                    .try_get("name")
                    .map_err(|e| RepositoryError::Storage(e.to_string()))?,
                description: row.try_get("description").ok().flatten(),
                purpose: row.try_get("purpose").ok().flatten(),
                relevance: row.try_get("relevance").ok().flatten(),
                system_prompt_id: row.try_get("system_prompt_id").ok().flatten(),
                grading_methods: self.grading_methods(id).await?,
            });
        }
        Ok(modules)
    }

    async fn get(&self, id: i64) -> Result<ModuleDetail, RepositoryError> {
        let module = self.module_row(id).await?;

        let system_prompt = match module.system_prompt_id {
            Some(prompt_id) => sqlx::query(
                "SELECT id, name, content, created_at FROM system_prompts WHERE id = ?",
            )
            .bind(prompt_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?
            .map(|row| {
                Ok::<_, RepositoryError>(SystemPrompt {
                    id: prompt_id,
                    name: row
                        .try_get("name")
                        .map_err(|e| RepositoryError::Storage(e.to_string()))?,
                    content: row
                        .try_get("content")
                        .map_err(|e| RepositoryError::Storage(e.to_string()))?,
                    created_at: column_datetime(&row, "created_at")?,
                })
            })
            .transpose()?,
            None => None,
        };

        let test_cases = self.list_test_cases(id).await?;

        Ok(ModuleDetail {
            module,
            system_prompt,
            test_cases,
        })
    }

    async fn create(&self, module: &NewModule) -> Result<Module, RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        let result = sqlx::query(
            "INSERT INTO modules (name, description, purpose, relevance, system_prompt_id) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&module.name)
        .bind(&module.description)
        .bind(&module.purpose)
        .bind(&module.relevance)
        .bind(module.system_prompt_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        let module_id = result.last_insert_rowid();

        for method in &module.grading_methods {
            sqlx::query(
                "INSERT OR IGNORE INTO module_grading_methods (module_id, grading_method) VALUES (?, ?)",
            )
            .bind(module_id)
            .bind(method.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        self.module_row(module_id).await
    }

    async fn update(&self, id: i64, update: &ModuleUpdate) -> Result<Module, RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        let result = sqlx::query(
            "UPDATE modules SET name = ?, description = ?, purpose = ?, relevance = ?, system_prompt_id = ? WHERE id = ?",
        )
        .bind(&update.name)
        .bind(&update.description)
        .bind(&update.purpose)
        .bind(&update.relevance)
        .bind(update.system_prompt_id)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("Module with ID {id}")));
        }

        // Replace the grading-method set wholesale
        sqlx::query("DELETE FROM module_grading_methods WHERE module_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        for method in &update.grading_methods {
            sqlx::query(
                "INSERT OR IGNORE INTO module_grading_methods (module_id, grading_method) VALUES (?, ?)",
            )
            .bind(id)
            .bind(method.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        self.module_row(id).await
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM modules WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("Module with ID {id}")));
        }

        Ok(())
    }

    async fn add_test_case(
        &self,
        module_id: i64,
        test_case: &NewTestCase,
    ) -> Result<TestCase, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO test_cases (module_id, input, reference_response, system_prompt_id) VALUES (?, ?, ?, ?)",
        )
        .bind(module_id)
        .bind(&test_case.input)
        .bind(&test_case.reference_response)
        .bind(test_case.system_prompt_id)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                RepositoryError::NotFound(format!("Module with ID {module_id}"))
            }
            _ => RepositoryError::Storage(e.to_string()),
        })?;

        let id = result.last_insert_rowid();

        let row = sqlx::query(
            r#"
            SELECT tc.id, tc.module_id, tc.input, tc.reference_response, tc.system_prompt_id,
                   sp.name AS system_prompt_name
            FROM test_cases tc
            LEFT JOIN system_prompts sp ON tc.system_prompt_id = sp.id
            WHERE tc.id = ?
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        row_to_test_case(&row)
    }

    async fn list_test_cases(&self, module_id: i64) -> Result<Vec<TestCase>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT tc.id, tc.module_id, tc.input, tc.reference_response, tc.system_prompt_id,
                   sp.name AS system_prompt_name
            FROM test_cases tc
            LEFT JOIN system_prompts sp ON tc.system_prompt_id = sp.id
            WHERE tc.module_id = ?
            ORDER BY tc.id
            "#,
        )
        .bind(module_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        rows.iter().map(row_to_test_case).collect()
    }

    async fn remove_test_case(
        &self,
        module_id: i64,
        test_case_id: i64,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM test_cases WHERE id = ? AND module_id = ?")
            .bind(test_case_id)
            .bind(module_id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!(
                "Test case {test_case_id} in module {module_id}"
            )));
        }

        Ok(())
    }

    async fn resolved_test_cases(
        &self,
        module_id: i64,
        ids: Option<&[i64]>,
    ) -> Result<Vec<ResolvedTestCase>, RepositoryError> {
        let base = r#"
            SELECT tc.id, tc.input AS prompt, tc.reference_response AS expected_response,
                   tc.system_prompt_id, sp.content AS system_prompt_content
            FROM test_cases tc
            LEFT JOIN system_prompts sp ON tc.system_prompt_id = sp.id
            WHERE tc.module_id = ?
        "#;

        let rows = match ids {
            Some(ids) if !ids.is_empty() => {
                let query = format!("{base} AND tc.id IN ({})", placeholders(ids.len()));
                let mut q = sqlx::query(&query).bind(module_id);
                for id in ids {
                    q = q.bind(id);
                }
                q.fetch_all(&self.pool)
                    .await
                    .map_err(|e| RepositoryError::Storage(e.to_string()))?
            }
            _ => sqlx::query(base)
                .bind(module_id)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| RepositoryError::Storage(e.to_string()))?,
        };

        rows.iter()
            .map(|row| {
                Ok(ResolvedTestCase {
                    id: row
                        .try_get("id")
                        .map_err(|e| RepositoryError::Storage(e.to_string()))?,
                    prompt: row
                        .try_get("prompt")
                        .map_err(|e| RepositoryError::Storage(e.to_string()))?,
                    expected_response: row
                        .try_get("expected_response")
                        .map_err(|e| RepositoryError::Storage(e.to_string()))?,
                    system_prompt_id: row.try_get("system_prompt_id").ok().flatten(),
                    system_prompt_content: row.try_get("system_prompt_content").ok().flatten(),
                })
            })
            .collect()
    }
}

fn row_to_test_case(row: &sqlx::sqlite::SqliteRow) -> Result<TestCase, RepositoryError> {
    Ok(TestCase {
        id: row
            .try_get("id")
            .map_err(|e| RepositoryError::Storage(e.to_string()))?,
        module_id: row
            .try_get("module_id")
            .map_err(|e| RepositoryError::Storage(e.to_string()))?,
        input: row
            .try_get("input")
            .map_err(|e| RepositoryError::Storage(e.to_string()))?,
        reference_response: row
            .try_get("reference_response")
            .map_err(|e| RepositoryError::Storage(e.to_string()))?,
        system_prompt_id: row.try_get("system_prompt_id").ok().flatten(),
        system_prompt_name: row.try_get("system_prompt_name").ok().flatten(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::setup_test_database;
    use evalhub_core::GradingMethod;

    async fn repo() -> SqliteModuleRepository {
        let pool = setup_test_database().await.unwrap();
        SqliteModuleRepository::new(pool)
    }

    fn new_module(methods: Vec<GradingMethod>) -> NewModule {
        NewModule {
            name: "Summarization".to_string(),
            description: Some("Summarize things".to_string()),
            purpose: None,
            relevance: None,
            system_prompt_id: None,
            grading_methods: methods,
        }
    }

    #[tokio::test]
    async fn create_and_get_round_trip() {
        let repo = repo().await;
        let created = repo
            .create(&new_module(vec![GradingMethod::Bleu, GradingMethod::Rouge]))
            .await
            .unwrap();

        assert_eq!(
            created.grading_methods,
            vec![GradingMethod::Bleu, GradingMethod::Rouge]
        );

        let detail = repo.get(created.id).await.unwrap();
        assert_eq!(detail.module.name, "Summarization");
        assert!(detail.system_prompt.is_none());
        assert!(detail.test_cases.is_empty());
    }

    #[tokio::test]
    async fn get_unknown_module_is_not_found() {
        let repo = repo().await;
        assert!(matches!(
            repo.get(42).await,
            Err(RepositoryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_replaces_the_grading_method_set() {
        let repo = repo().await;
        let created = repo
            .create(&new_module(vec![GradingMethod::Bleu, GradingMethod::Rouge]))
            .await
            .unwrap();

        let updated = repo
            .update(
                created.id,
                &ModuleUpdate {
                    name: "Summarization v2".to_string(),
                    description: None,
                    purpose: None,
                    relevance: None,
                    system_prompt_id: None,
                    grading_methods: vec![GradingMethod::LlmJudge],
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Summarization v2");
        assert_eq!(updated.grading_methods, vec![GradingMethod::LlmJudge]);
    }

    #[tokio::test]
    async fn delete_cascades_to_test_cases() {
        let repo = repo().await;
        let module = repo.create(&new_module(vec![GradingMethod::Bleu])).await.unwrap();
        repo.add_test_case(
            module.id,
            &NewTestCase {
                input: "q".to_string(),
                reference_response: "a".to_string(),
                system_prompt_id: None,
            },
        )
        .await
        .unwrap();

        repo.delete(module.id).await.unwrap();

        let orphans: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM test_cases")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_eq!(orphans.0, 0);
    }

    #[tokio::test]
    async fn resolved_test_cases_filters_by_subset() {
        let repo = repo().await;
        let module = repo.create(&new_module(vec![GradingMethod::Bleu])).await.unwrap();
        let a = repo
            .add_test_case(
                module.id,
                &NewTestCase {
                    input: "q1".to_string(),
                    reference_response: "a1".to_string(),
                    system_prompt_id: None,
                },
            )
            .await
            .unwrap();
        repo.add_test_case(
            module.id,
            &NewTestCase {
                input: "q2".to_string(),
                reference_response: "a2".to_string(),
                system_prompt_id: None,
            },
        )
        .await
        .unwrap();

        let all = repo.resolved_test_cases(module.id, None).await.unwrap();
        assert_eq!(all.len(), 2);

        // Foreign ids are silently absent so callers can detect them
        let subset = repo
            .resolved_test_cases(module.id, Some(&[a.id, 999]))
            .await
            .unwrap();
        assert_eq!(subset.len(), 1);
        assert_eq!(subset[0].prompt, "q1");
    }
}
