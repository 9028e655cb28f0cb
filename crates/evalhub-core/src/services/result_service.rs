//! Result read service.

use std::sync::Arc;

use crate::domain::TestResult;
use crate::ports::{CoreError, ResultRepository};

/// Read access to scored results - a thin facade.
pub struct ResultService {
    repo: Arc<dyn ResultRepository>,
}

impl ResultService {
    /// Create a new result service.
    pub fn new(repo: Arc<dyn ResultRepository>) -> Self {
        Self { repo }
    }

    /// List all results, newest first.
    pub async fn list(&self) -> Result<Vec<TestResult>, CoreError> {
        self.repo.list().await.map_err(CoreError::from)
    }

    /// Get one result by ID.
    pub async fn get(&self, id: i64) -> Result<TestResult, CoreError> {
        self.repo.get(id).await.map_err(CoreError::from)
    }
}
