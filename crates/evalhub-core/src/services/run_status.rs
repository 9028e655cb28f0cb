//! Run status query surface - read-only views over test runs.

use std::sync::Arc;

use crate::domain::RunOverview;
use crate::ports::{CoreError, RunRepository};

/// Bounded window for the completed-runs digest.
const COMPLETED_DIGEST_LIMIT: u32 = 50;

/// Read-only status views for the polling UI.
pub struct RunStatusService {
    repo: Arc<dyn RunRepository>,
}

impl RunStatusService {
    /// Create a new status service.
    pub fn new(repo: Arc<dyn RunRepository>) -> Self {
        Self { repo }
    }

    /// Active runs plus the completed digest, in one payload.
    pub async fn overview(&self) -> Result<RunOverview, CoreError> {
        let active_runs = self.repo.list_active().await?;
        let completed_runs = self.repo.completed_digest(COMPLETED_DIGEST_LIMIT).await?;
        Ok(RunOverview {
            active_runs,
            completed_runs,
        })
    }
}
