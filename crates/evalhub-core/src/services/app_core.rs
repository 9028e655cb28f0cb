//! `AppCore` - the composed application facade.
//!
//! Adapters construct one `AppCore` from a `Repos` container, an
//! evaluation engine, and a key vault, and reach every service through
//! it. Composition only - no domain logic here.

use std::sync::Arc;

use crate::ports::{EvaluationEngine, Repos};
use crate::services::{
    KeyVault, ModelService, ModuleService, ResultService, RunOrchestrator, RunStatusService,
    SystemPromptService,
};

/// The composed service container shared by all adapters.
pub struct AppCore {
    modules: ModuleService,
    prompts: SystemPromptService,
    models: ModelService,
    orchestrator: Arc<RunOrchestrator>,
    run_status: RunStatusService,
    results: ResultService,
}

impl AppCore {
    /// Wire all services from their ports.
    pub fn new(repos: Repos, engine: Arc<dyn EvaluationEngine>, vault: Arc<KeyVault>) -> Self {
        let orchestrator = Arc::new(RunOrchestrator::new(
            repos.modules.clone(),
            repos.models.clone(),
            repos.runs.clone(),
            engine,
            vault.clone(),
        ));

        Self {
            modules: ModuleService::new(repos.modules),
            prompts: SystemPromptService::new(repos.prompts),
            models: ModelService::new(repos.models, vault),
            orchestrator,
            run_status: RunStatusService::new(repos.runs),
            results: ResultService::new(repos.results),
        }
    }

    /// Module CRUD service.
    pub const fn modules(&self) -> &ModuleService {
        &self.modules
    }

    /// System prompt service.
    pub const fn prompts(&self) -> &SystemPromptService {
        &self.prompts
    }

    /// Model registry service.
    pub const fn models(&self) -> &ModelService {
        &self.models
    }

    /// The run orchestrator.
    pub const fn orchestrator(&self) -> &Arc<RunOrchestrator> {
        &self.orchestrator
    }

    /// Run status query surface.
    pub const fn run_status(&self) -> &RunStatusService {
        &self.run_status
    }

    /// Result read surface.
    pub const fn results(&self) -> &ResultService {
        &self.results
    }
}
