//! Model registry service - registrations and encrypted API keys.

use std::sync::Arc;

use crate::domain::{ApiKeyRecord, ModelRegistration, NewModelRegistration};
use crate::ports::{CoreError, ModelRepository, RepositoryError};
use crate::secrets::ApiKey;
use crate::services::KeyVault;

/// Service for model registrations and key management.
///
/// Plaintext keys only exist between this service and its caller; the
/// repository sees ciphertext records exclusively.
pub struct ModelService {
    repo: Arc<dyn ModelRepository>,
    vault: Arc<KeyVault>,
}

impl ModelService {
    /// Create a new model service.
    pub fn new(repo: Arc<dyn ModelRepository>, vault: Arc<KeyVault>) -> Self {
        Self { repo, vault }
    }

    /// List all registered models.
    pub async fn list(&self) -> Result<Vec<ModelRegistration>, CoreError> {
        self.repo.list().await.map_err(CoreError::from)
    }

    /// Register or refresh a model implementation.
    pub async fn register(
        &self,
        registration: NewModelRegistration,
    ) -> Result<ModelRegistration, CoreError> {
        if registration.name.trim().is_empty() {
            return Err(CoreError::Validation("model name is required".to_string()));
        }
        self.repo
            .upsert(&registration)
            .await
            .map_err(CoreError::from)
    }

    /// Store a model's API key (encrypted), or clear it with None/empty.
    pub async fn store_key(&self, name: &str, plaintext: Option<&str>) -> Result<(), CoreError> {
        let model = self.repo.get_by_name(name).await?;

        let record = match plaintext.filter(|k| !k.is_empty()) {
            Some(key) => self.vault.encrypt(key)?,
            None => ApiKeyRecord::empty(),
        };

        self.repo
            .store_api_key(model.id, &record)
            .await
            .map_err(CoreError::from)
    }

    /// Fetch a model's decrypted API key.
    ///
    /// Returns Ok(None) for unknown models and models without a stored
    /// key, mirroring the admin UI contract.
    pub async fn fetch_key(&self, name: &str) -> Result<Option<ApiKey>, CoreError> {
        let model = match self.repo.get_by_name(name).await {
            Ok(model) => model,
            Err(RepositoryError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let Some(record) = self.repo.api_key(model.id).await? else {
            // Seed an empty record so the UI can track key status.
            self.repo
                .store_api_key(model.id, &ApiKeyRecord::empty())
                .await?;
            return Ok(None);
        };

        if !record.is_present() {
            return Ok(None);
        }

        Ok(Some(self.vault.decrypt(&record)?))
    }
}
