//! Result repository trait definition (read side).
//!
//! Result rows are written by the run repository's `complete_batch` so
//! the status flip and the insert share one transaction; this port only
//! reads them back for the results surface.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::TestResult;

/// Read access to persisted test results.
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// List all results with display joins, newest first.
    async fn list(&self) -> Result<Vec<TestResult>, RepositoryError>;

    /// Get one result by ID.
    ///
    /// Returns `Err(RepositoryError::NotFound)` if it doesn't exist.
    async fn get(&self, id: i64) -> Result<TestResult, RepositoryError>;
}
