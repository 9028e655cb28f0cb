//! System prompt service.

use std::sync::Arc;

use crate::domain::{NewSystemPrompt, SystemPrompt};
use crate::ports::{CoreError, SystemPromptRepository};

/// Service for system prompt operations - a thin facade.
pub struct SystemPromptService {
    repo: Arc<dyn SystemPromptRepository>,
}

impl SystemPromptService {
    /// Create a new prompt service with the given repository.
    pub fn new(repo: Arc<dyn SystemPromptRepository>) -> Self {
        Self { repo }
    }

    /// List all system prompts.
    pub async fn list(&self) -> Result<Vec<SystemPrompt>, CoreError> {
        self.repo.list().await.map_err(CoreError::from)
    }

    /// Get a system prompt by ID.
    pub async fn get(&self, id: i64) -> Result<SystemPrompt, CoreError> {
        self.repo.get(id).await.map_err(CoreError::from)
    }

    /// Create a system prompt.
    pub async fn create(&self, prompt: NewSystemPrompt) -> Result<SystemPrompt, CoreError> {
        if prompt.name.trim().is_empty() || prompt.content.trim().is_empty() {
            return Err(CoreError::Validation(
                "prompt name and content are required".to_string(),
            ));
        }
        self.repo.create(&prompt).await.map_err(CoreError::from)
    }

    /// Update a system prompt.
    pub async fn update(
        &self,
        id: i64,
        prompt: NewSystemPrompt,
    ) -> Result<SystemPrompt, CoreError> {
        self.repo.update(id, &prompt).await.map_err(CoreError::from)
    }

    /// Delete a system prompt.
    pub async fn delete(&self, id: i64) -> Result<(), CoreError> {
        self.repo.delete(id).await.map_err(CoreError::from)
    }
}
