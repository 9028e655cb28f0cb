//! Test-run domain types: the intent/status records of the orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::grading::GradingMethod;

/// Lifecycle state of a test run.
///
/// Normal flow is `Pending -> Running -> {Completed | Failed}`.
/// Cancellation moves `Pending`/`Running` rows straight to `Failed`;
/// terminal rows are never mutated again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    /// Parse a status from its storage name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Storage name of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether this status is terminal (no further transitions).
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One (test case, grading method) intent row within a run request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRun {
    pub id: i64,
    pub test_case_id: i64,
    pub grading_method: GradingMethod,
    pub status: RunStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A run row to be inserted as part of a batch (always starts `pending`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTestRun {
    pub test_case_id: i64,
    pub grading_method: GradingMethod,
}

/// A pending/running run joined with test case and module info for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveRun {
    pub id: i64,
    pub test_case_id: i64,
    pub grading_method: GradingMethod,
    pub status: RunStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Test case input, for display.
    pub input: Option<String>,
    pub module_id: Option<i64>,
    pub module_name: Option<String>,
    pub module_description: Option<String>,
}

/// Digest row for the completed-runs view: terminal runs grouped by
/// module and completion minute.
///
/// This trades row-level fidelity for a human-scannable summary; it is a
/// UI convenience, not an audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedRunGroup {
    pub module_id: Option<i64>,
    pub module_name: Option<String>,
    /// Completion timestamp bucketed to the minute ("YYYY-MM-DD HH:MM:00").
    pub completion_time: String,
    /// Number of distinct test cases in the group.
    pub test_case_count: i64,
    /// Set of grading methods involved in the group.
    pub grading_methods: Vec<GradingMethod>,
    pub status: RunStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Combined payload of the status query surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOverview {
    pub active_runs: Vec<ActiveRun>,
    pub completed_runs: Vec<CompletedRunGroup>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips() {
        for status in [
            RunStatus::Pending,
            RunStatus::Running,
            RunStatus::Completed,
            RunStatus::Failed,
        ] {
            assert_eq!(RunStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(RunStatus::parse("cancelled"), None);
    }

    #[test]
    fn terminal_states() {
        assert!(!RunStatus::Pending.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
    }
}
