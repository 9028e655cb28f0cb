//! Run repository trait definition.
//!
//! This port owns the transactional write units of the orchestrator:
//! the atomic batch insert at run creation and the atomic
//! completions-plus-results write at reconciliation. Keeping both
//! behind one port lets implementations guarantee that a result row
//! exists if and only if its run reached `completed`.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::{
    ActiveRun, CompletedRunGroup, GradingMethod, NewTestResult, NewTestRun, RunStatus, TestRun,
};

/// One reconciled (test case, grading method) outcome.
#[derive(Debug, Clone)]
pub struct CompletedEvaluation {
    pub test_case_id: i64,
    pub grading_method: GradingMethod,
    pub result: NewTestResult,
}

/// Repository for test-run persistence and status transitions.
#[async_trait]
pub trait RunRepository: Send + Sync {
    /// Insert a batch of `pending` runs atomically (all-or-nothing).
    ///
    /// Returns the generated IDs in insertion order. An empty batch
    /// returns an empty list without touching storage.
    async fn create_batch(&self, entries: &[NewTestRun]) -> Result<Vec<i64>, RepositoryError>;

    /// Flip the given runs from `pending` to `running`.
    async fn mark_running(&self, run_ids: &[i64]) -> Result<(), RepositoryError>;

    /// Apply reconciled completions atomically.
    ///
    /// For each completion, the matching run (by test case + method,
    /// scoped to `run_ids`) is flipped to `completed` and one result
    /// row is inserted - in a single transaction, so a failure leaves
    /// neither the status flip nor the result behind. A run that is
    /// already terminal (e.g. cancelled mid-flight) is skipped and its
    /// result row is NOT inserted.
    async fn complete_batch(
        &self,
        run_ids: &[i64],
        completions: &[CompletedEvaluation],
    ) -> Result<(), RepositoryError>;

    /// Flip every non-terminal run in the batch to `failed`.
    ///
    /// Used both for whole-batch failure (engine error) and for
    /// sweeping pairs the engine's output silently omitted. Returns the
    /// number of rows flipped.
    async fn fail_unresolved(&self, run_ids: &[i64]) -> Result<u64, RepositoryError>;

    /// Cancel a run: `pending`/`running` rows flip to `failed`;
    /// terminal rows are left untouched. Returns the resulting status.
    ///
    /// Returns `Err(RepositoryError::NotFound)` if the run doesn't exist.
    async fn cancel(&self, run_id: i64) -> Result<RunStatus, RepositoryError>;

    /// Get a single run by ID.
    async fn get(&self, run_id: i64) -> Result<TestRun, RepositoryError>;

    /// All `pending`/`running` runs joined with display info, ordered
    /// running-before-pending then newest-first.
    async fn list_active(&self) -> Result<Vec<ActiveRun>, RepositoryError>;

    /// Terminal runs grouped by module and completion minute,
    /// newest-first, capped to `limit` groups.
    async fn completed_digest(&self, limit: u32) -> Result<Vec<CompletedRunGroup>, RepositoryError>;
}
