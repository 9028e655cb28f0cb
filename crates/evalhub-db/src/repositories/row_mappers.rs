//! Row mapping helpers for `SQLite` queries.

use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use evalhub_core::{
    ActiveRun, GradingMethod, RepositoryError, RunStatus, ScoreDetail, TestResult, TestRun,
};

/// Helper to parse datetime strings written by `datetime('now')`.
pub fn parse_datetime(datetime_str: Option<String>) -> Option<DateTime<Utc>> {
    datetime_str.and_then(|s| {
        let trimmed = s.trim_end_matches(" UTC");
        NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f")
            .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc))
            .ok()
    })
}

/// Read a TEXT column as a required datetime, falling back to now.
pub fn column_datetime(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>, RepositoryError> {
    let raw: Option<String> = row
        .try_get(column)
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;
    Ok(parse_datetime(raw).unwrap_or_else(Utc::now))
}

/// Parse a stored grading method name.
pub fn parse_grading_method(raw: &str) -> Result<GradingMethod, RepositoryError> {
    GradingMethod::parse(raw)
        .ok_or_else(|| RepositoryError::Serialization(format!("unknown grading method '{raw}'")))
}

/// Parse a stored run status name.
pub fn parse_run_status(raw: &str) -> Result<RunStatus, RepositoryError> {
    RunStatus::parse(raw)
        .ok_or_else(|| RepositoryError::Serialization(format!("unknown run status '{raw}'")))
}

/// Parse a database row into a `TestRun`.
pub fn row_to_test_run(row: &SqliteRow) -> Result<TestRun, RepositoryError> {
    let method: String = row
        .try_get("grading_method")
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;
    let status: String = row
        .try_get("status")
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

    Ok(TestRun {
        id: row
            .try_get("id")
            .map_err(|e| RepositoryError::Storage(e.to_string()))?,
        test_case_id: row
            .try_get("test_case_id")
            .map_err(|e| RepositoryError::Storage(e.to_string()))?,
        grading_method: parse_grading_method(&method)?,
        status: parse_run_status(&status)?,
        created_at: column_datetime(row, "created_at")?,
        updated_at: column_datetime(row, "updated_at")?,
    })
}

/// Parse a joined status-view row into an `ActiveRun`.
pub fn row_to_active_run(row: &SqliteRow) -> Result<ActiveRun, RepositoryError> {
    let method: String = row
        .try_get("grading_method")
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;
    let status: String = row
        .try_get("status")
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

    Ok(ActiveRun {
        id: row
            .try_get("id")
            .map_err(|e| RepositoryError::Storage(e.to_string()))?,
        test_case_id: row
            .try_get("test_case_id")
            .map_err(|e| RepositoryError::Storage(e.to_string()))?,
        grading_method: parse_grading_method(&method)?,
        status: parse_run_status(&status)?,
        created_at: column_datetime(row, "created_at")?,
        updated_at: column_datetime(row, "updated_at")?,
        input: row.try_get("input").ok(),
        module_id: row.try_get("module_id").ok().flatten(),
        module_name: row.try_get("module_name").ok().flatten(),
        module_description: row.try_get("module_description").ok().flatten(),
    })
}

/// Parse a joined result row into a `TestResult`.
pub fn row_to_test_result(row: &SqliteRow) -> Result<TestResult, RepositoryError> {
    let method_raw: String = row
        .try_get("grading_method")
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;
    let method = parse_grading_method(&method_raw)?;

    let scores_raw: String = row
        .try_get("attribute_scores")
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;
    let attribute_scores = ScoreDetail::from_stored(method, &scores_raw)
        .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

    Ok(TestResult {
        id: row
            .try_get("id")
            .map_err(|e| RepositoryError::Storage(e.to_string()))?,
        test_case_id: row
            .try_get("test_case_id")
            .map_err(|e| RepositoryError::Storage(e.to_string()))?,
        module_id: row
            .try_get("module_id")
            .map_err(|e| RepositoryError::Storage(e.to_string()))?,
        model_implementation: row
            .try_get("model_implementation")
            .map_err(|e| RepositoryError::Storage(e.to_string()))?,
        model_name: row
            .try_get("model_name")
            .map_err(|e| RepositoryError::Storage(e.to_string()))?,
        prompt: row
            .try_get("prompt")
            .map_err(|e| RepositoryError::Storage(e.to_string()))?,
        model_response: row
            .try_get("model_response")
            .map_err(|e| RepositoryError::Storage(e.to_string()))?,
        reference_response: row
            .try_get("reference_response")
            .map_err(|e| RepositoryError::Storage(e.to_string()))?,
        grading_method: method,
        overall_score: row
            .try_get("overall_score")
            .map_err(|e| RepositoryError::Storage(e.to_string()))?,
        attribute_scores,
        system_prompt_id: row.try_get("system_prompt_id").ok().flatten(),
        system_prompt_content: row.try_get("system_prompt_content").ok().flatten(),
        created_at: column_datetime(row, "created_at")?,
        module_name: row.try_get("module_name").ok().flatten(),
        system_prompt_name: row.try_get("system_prompt_name").ok().flatten(),
    })
}

/// Build a `?, ?, ...` placeholder list for dynamic IN clauses.
pub fn placeholders(count: usize) -> String {
    std::iter::repeat_n("?", count).collect::<Vec<_>>().join(", ")
}
