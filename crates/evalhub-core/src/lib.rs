//! Core domain types, ports, and services for evalhub.
//!
//! This crate holds everything infrastructure-independent: the domain
//! model of modules, test cases, runs, and results; the port traits the
//! adapters implement; and the services - most importantly the run
//! orchestrator that fans a module's test cases out across grading
//! methods, dispatches the external evaluation engine, and reconciles
//! its output.

#![deny(unsafe_code)]

pub mod domain;
pub mod ports;
pub mod secrets;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::{
    ActiveRun, ApiKeyRecord, CompletedRunGroup, GradingMethod, Module, ModuleDetail,
    ModuleUpdate, ModelRegistration, NewModelRegistration, NewModule, NewSystemPrompt,
    NewTestCase, NewTestResult, NewTestRun, ResolvedTestCase, RunOverview, RunStatus,
    ScoreDetail, SystemPrompt, TestCase, TestResult, TestRun,
};
pub use ports::{
    CaseEvaluation, CaseReport, CompletedEvaluation, CoreError, EngineError, EngineReport,
    EvaluationEngine, EvaluationJob, JobCase, ModelRepository, ModuleRepository, Repos,
    RepositoryError, ResultRepository, RunRepository, SystemPromptRepository,
};
pub use secrets::ApiKey;
pub use services::{
    AppCore, KeyVault, ModelService, ModuleService, ResultService, RunOrchestrator,
    RunRequest, RunStatusService, SystemPromptService, VaultError,
};
