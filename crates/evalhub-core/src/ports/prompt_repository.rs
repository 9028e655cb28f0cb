//! System prompt repository trait definition.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::{NewSystemPrompt, SystemPrompt};

/// Repository for system prompt persistence operations.
#[async_trait]
pub trait SystemPromptRepository: Send + Sync {
    /// List all system prompts, newest first.
    async fn list(&self) -> Result<Vec<SystemPrompt>, RepositoryError>;

    /// Get a system prompt by ID.
    ///
    /// Returns `Err(RepositoryError::NotFound)` if it doesn't exist.
    async fn get(&self, id: i64) -> Result<SystemPrompt, RepositoryError>;

    /// Insert a new system prompt.
    async fn create(&self, prompt: &NewSystemPrompt) -> Result<SystemPrompt, RepositoryError>;

    /// Update a system prompt's name and content.
    async fn update(
        &self,
        id: i64,
        prompt: &NewSystemPrompt,
    ) -> Result<SystemPrompt, RepositoryError>;

    /// Delete a system prompt.
    async fn delete(&self, id: i64) -> Result<(), RepositoryError>;
}
