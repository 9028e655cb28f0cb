//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core domain expects from
//! infrastructure. They contain no implementation details and use only
//! domain types.
//!
//! # Design Rules
//!
//! - No `sqlx` types in any signature
//! - No process/filesystem implementation details
//! - Traits are minimal and CRUD-focused for repositories
//! - The run repository owns the transactional write units of the
//!   orchestrator (batch insert, batch completion)

pub mod evaluation_engine;
pub mod model_repository;
pub mod module_repository;
pub mod prompt_repository;
pub mod result_repository;
pub mod run_repository;

use std::sync::Arc;
use thiserror::Error;

pub use evaluation_engine::{
    CaseEvaluation, CaseReport, EngineError, EngineReport, EvaluationEngine, EvaluationJob,
    JobCase,
};
pub use model_repository::ModelRepository;
pub use module_repository::ModuleRepository;
pub use prompt_repository::SystemPromptRepository;
pub use result_repository::ResultRepository;
pub use run_repository::{CompletedEvaluation, RunRepository};

/// Container for all repository trait objects.
///
/// This struct provides a consistent way to wire repositories across
/// adapters without coupling them to concrete implementations. It lives
/// in `evalhub-core` so that `AppCore` can accept it without depending
/// on `evalhub-db`.
#[derive(Clone)]
pub struct Repos {
    /// Modules, grading-method assignments, and test cases.
    pub modules: Arc<dyn ModuleRepository>,
    /// System prompts.
    pub prompts: Arc<dyn SystemPromptRepository>,
    /// Model registrations and encrypted API keys.
    pub models: Arc<dyn ModelRepository>,
    /// Test runs (the orchestrator's write side).
    pub runs: Arc<dyn RunRepository>,
    /// Test results (read side).
    pub results: Arc<dyn ResultRepository>,
}

impl Repos {
    /// Create a new Repos container.
    pub fn new(
        modules: Arc<dyn ModuleRepository>,
        prompts: Arc<dyn SystemPromptRepository>,
        models: Arc<dyn ModelRepository>,
        runs: Arc<dyn RunRepository>,
        results: Arc<dyn ResultRepository>,
    ) -> Self {
        Self {
            modules,
            prompts,
            models,
            runs,
            results,
        }
    }
}

/// Domain-specific errors for repository operations.
///
/// This error type abstracts away storage implementation details (e.g.,
/// sqlx errors) and provides a clean interface for services to handle
/// storage failures.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The requested entity was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An entity with the same identifier already exists.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Storage backend error (database, filesystem, etc.).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A constraint was violated (e.g., foreign key, unique constraint).
    #[error("Constraint violation: {0}")]
    Constraint(String),
}

/// Core error type for semantic domain errors.
///
/// This is the canonical error type used across the core domain.
/// Adapters map this to their own error types (HTTP status codes, CLI
/// exit codes).
#[derive(Debug, Error)]
pub enum CoreError {
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Evaluation engine invocation failed.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Validation error (invalid input or unusable precondition).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error (unexpected condition).
    #[error("Internal error: {0}")]
    Internal(String),
}
