//! Evaluation engine port and its wire contract.
//!
//! The engine is an out-of-process black box: it receives one job
//! document, runs the model and the grading methods, and emits one
//! result document. The orchestrator invokes it at most once per run
//! request and treats every failure mode - spawn error, nonzero exit,
//! unparseable output, `success:false` - as total failure of the batch.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::GradingMethod;
use crate::secrets::ApiKey;

/// One test case as dispatched to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobCase {
    pub id: i64,
    pub prompt: String,
    pub expected_response: String,
    /// Effective system prompt (case override, else module default).
    pub system_prompt: Option<String>,
}

/// The job handed to the engine for one run request.
///
/// Deliberately not `Serialize`: the credential is only written out via
/// [`EvaluationJob::to_stdin_document`], at the process boundary.
#[derive(Debug, Clone)]
pub struct EvaluationJob {
    pub test_cases: Vec<JobCase>,
    pub model_implementation: String,
    pub specific_model: String,
    pub api_key: ApiKey,
    pub grading_methods: Vec<GradingMethod>,
}

impl EvaluationJob {
    /// Render the job as the JSON document the engine reads from stdin.
    #[must_use]
    pub fn to_stdin_document(&self) -> Value {
        serde_json::json!({
            "test_cases": self.test_cases,
            "model_implementation": self.model_implementation,
            "specific_model": self.specific_model,
            "api_key": self.api_key.expose(),
            "grading_methods": self.grading_methods,
        })
    }
}

/// One grading method's evaluation of one test case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseEvaluation {
    pub score: f64,
    #[serde(default)]
    pub details: Value,
}

/// The engine's report for one test case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseReport {
    pub test_case_id: i64,
    pub prompt: String,
    pub model_response: String,
    pub expected_response: String,
    /// Evaluations keyed by grading method. A key outside the closed
    /// enumeration fails document parsing, which fails the batch.
    pub evaluation_result: BTreeMap<GradingMethod, CaseEvaluation>,
}

/// A successfully parsed `success:true` engine document.
#[derive(Debug, Clone)]
pub struct EngineReport {
    pub results: Vec<CaseReport>,
}

impl EngineReport {
    /// Parse the engine's stdout document.
    ///
    /// `{success:false}` maps to [`EngineError::Reported`]; anything
    /// that doesn't deserialize maps to [`EngineError::MalformedOutput`].
    pub fn from_document(document: &str) -> Result<Self, EngineError> {
        #[derive(Deserialize)]
        struct RawReply {
            success: bool,
            #[serde(default)]
            error: Option<String>,
            #[serde(default)]
            results: Option<Vec<CaseReport>>,
        }

        let raw: RawReply = serde_json::from_str(document)
            .map_err(|e| EngineError::MalformedOutput(e.to_string()))?;

        if !raw.success {
            return Err(EngineError::Reported(
                raw.error.unwrap_or_else(|| "engine reported failure".to_string()),
            ));
        }

        Ok(Self {
            results: raw.results.unwrap_or_default(),
        })
    }
}

/// Failure modes of an engine invocation.
///
/// All variants are handled identically by the orchestrator (whole
/// batch failed); the distinction exists for logging and tests.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine process could not be started.
    #[error("Failed to spawn engine: {0}")]
    SpawnFailed(String),

    /// I/O with the engine process failed.
    #[error("Engine I/O error: {0}")]
    Io(String),

    /// The engine exited with a nonzero status.
    #[error("Engine exited with {status}: {stderr}")]
    NonZeroExit { status: String, stderr: String },

    /// The engine's output document did not parse.
    #[error("Malformed engine output: {0}")]
    MalformedOutput(String),

    /// The engine reported `success:false`.
    #[error("Engine failure: {0}")]
    Reported(String),
}

/// The external evaluation engine.
///
/// Invoked at most once per run request; the implementation owns all
/// retry/timeout/rate-limit behavior internally.
#[async_trait]
pub trait EvaluationEngine: Send + Sync {
    /// Run the job to completion and return the parsed report.
    async fn evaluate(&self, job: &EvaluationJob) -> Result<EngineReport, EngineError>;
}
