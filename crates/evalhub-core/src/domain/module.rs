//! Module and test-case domain types.
//!
//! A module is a named collection of test cases plus the set of grading
//! methods applied to them. These types are independent of any
//! infrastructure concerns.

use serde::{Deserialize, Serialize};

use super::grading::GradingMethod;
use super::prompt::SystemPrompt;

/// A persisted evaluation module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    /// Database ID of the module.
    pub id: i64,
    /// Human-readable module name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// What the module is meant to evaluate.
    pub purpose: Option<String>,
    /// Why the module matters for the product under test.
    pub relevance: Option<String>,
    /// Default system prompt applied to test cases without an override.
    pub system_prompt_id: Option<i64>,
    /// Grading methods assigned to this module (set semantics).
    pub grading_methods: Vec<GradingMethod>,
}

/// A module to be inserted (no ID yet).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewModule {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub relevance: Option<String>,
    #[serde(default)]
    pub system_prompt_id: Option<i64>,
    #[serde(default)]
    pub grading_methods: Vec<GradingMethod>,
}

/// Full replacement payload for updating a module.
///
/// The grading-method set is replaced wholesale, mirroring how the
/// admin UI submits the whole form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleUpdate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub relevance: Option<String>,
    #[serde(default)]
    pub system_prompt_id: Option<i64>,
    #[serde(default)]
    pub grading_methods: Vec<GradingMethod>,
}

/// A module with its resolved default prompt and test cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDetail {
    #[serde(flatten)]
    pub module: Module,
    /// Resolved default system prompt, if one is assigned.
    pub system_prompt: Option<SystemPrompt>,
    pub test_cases: Vec<TestCase>,
}

/// A persisted test case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    /// Database ID of the test case.
    pub id: i64,
    /// Owning module.
    pub module_id: i64,
    /// The prompt sent to the model.
    pub input: String,
    /// The expected model output.
    pub reference_response: String,
    /// Per-case system prompt override (None means use the module default).
    pub system_prompt_id: Option<i64>,
    /// Name of the override prompt, joined in for display.
    pub system_prompt_name: Option<String>,
}

/// A test case to be inserted under a module (no ID yet).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTestCase {
    pub input: String,
    pub reference_response: String,
    #[serde(default)]
    pub system_prompt_id: Option<i64>,
}

/// A test case with its effective system prompt resolved for dispatch.
///
/// `system_prompt_content` is the case's own override when present; the
/// orchestrator falls back to the module default when it is None.
#[derive(Debug, Clone)]
pub struct ResolvedTestCase {
    pub id: i64,
    pub prompt: String,
    pub expected_response: String,
    pub system_prompt_id: Option<i64>,
    pub system_prompt_content: Option<String>,
}
