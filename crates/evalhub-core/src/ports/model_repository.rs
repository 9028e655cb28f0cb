//! Model registration repository trait definition.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::{ApiKeyRecord, ModelRegistration, NewModelRegistration};

/// Repository for model registrations and their encrypted API keys.
///
/// Key records hold ciphertext only; encryption and decryption live in
/// the key vault, never here.
#[async_trait]
pub trait ModelRepository: Send + Sync {
    /// List all registered models.
    async fn list(&self) -> Result<Vec<ModelRegistration>, RepositoryError>;

    /// Get a registration by its unique name.
    ///
    /// Returns `Err(RepositoryError::NotFound)` if no model with that
    /// name is registered.
    async fn get_by_name(&self, name: &str) -> Result<ModelRegistration, RepositoryError>;

    /// Insert or refresh a registration by name, seeding an empty key
    /// record for new rows.
    async fn upsert(
        &self,
        registration: &NewModelRegistration,
    ) -> Result<ModelRegistration, RepositoryError>;

    /// Fetch the stored key record for a model, if any row exists.
    async fn api_key(&self, model_id: i64) -> Result<Option<ApiKeyRecord>, RepositoryError>;

    /// Store (or clear, with an empty record) a model's key record.
    async fn store_api_key(
        &self,
        model_id: i64,
        record: &ApiKeyRecord,
    ) -> Result<(), RepositoryError>;
}
