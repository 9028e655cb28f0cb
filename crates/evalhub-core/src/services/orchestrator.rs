//! Run orchestrator - creates run batches, dispatches the evaluation
//! engine, and reconciles its output into persistent state.
//!
//! Lifecycle: validation happens before any row is written; the
//! (test case x grading method) batch is inserted atomically as
//! `pending`; the caller gets the run IDs back immediately; a spawned
//! task owns the rest (`running` flip, engine invocation,
//! reconciliation). Post-dispatch failures never surface to the
//! original caller - they are only observable as terminal run status
//! through the status query surface.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{GradingMethod, NewTestResult, NewTestRun, RunStatus, ScoreDetail};
use crate::ports::{
    CompletedEvaluation, CoreError, EngineReport, EvaluationEngine, EvaluationJob, JobCase,
    ModelRepository, ModuleRepository, RepositoryError, RunRepository,
};
use crate::services::KeyVault;

/// A run-creation request as received from the API.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub module_id: i64,
    /// Subset of the module's test cases; None/empty means all of them.
    pub test_case_ids: Option<Vec<i64>>,
    /// Registered model implementation name.
    pub implementation: String,
    /// Specific model within the implementation.
    pub model: String,
}

/// A validated run with its batch committed and its job assembled.
///
/// Produced by [`RunOrchestrator::prepare`]; consumed by
/// [`RunOrchestrator::execute`]. Splitting the two makes the
/// background hand-off point explicit and lets tests drive the whole
/// flow deterministically.
#[derive(Debug)]
pub struct PreparedRun {
    /// IDs of the committed `pending` runs, in insertion order.
    pub test_run_ids: Vec<i64>,
    job: EvaluationJob,
    module_id: i64,
    /// Module default prompt snapshot, stored on every result row.
    system_prompt_id: Option<i64>,
    system_prompt_content: Option<String>,
}

/// Orchestrates the test-run lifecycle.
pub struct RunOrchestrator {
    modules: Arc<dyn ModuleRepository>,
    models: Arc<dyn ModelRepository>,
    runs: Arc<dyn RunRepository>,
    engine: Arc<dyn EvaluationEngine>,
    vault: Arc<KeyVault>,
}

impl RunOrchestrator {
    /// Create a new orchestrator over the given ports.
    pub fn new(
        modules: Arc<dyn ModuleRepository>,
        models: Arc<dyn ModelRepository>,
        runs: Arc<dyn RunRepository>,
        engine: Arc<dyn EvaluationEngine>,
        vault: Arc<KeyVault>,
    ) -> Self {
        Self {
            modules,
            models,
            runs,
            engine,
            vault,
        }
    }

    /// Create a run batch and hand evaluation off to a background task.
    ///
    /// Returns the committed run IDs as soon as the batch transaction
    /// commits; the caller never waits on the engine.
    pub async fn create_run(self: &Arc<Self>, request: RunRequest) -> Result<Vec<i64>, CoreError> {
        let prepared = self.prepare(request).await?;
        let test_run_ids = prepared.test_run_ids.clone();

        // Empty cross product (no test cases or no grading methods):
        // nothing to dispatch, the request trivially succeeds.
        if !test_run_ids.is_empty() {
            let orchestrator = Arc::clone(self);
            tokio::spawn(async move {
                orchestrator.execute(prepared).await;
            });
        }

        Ok(test_run_ids)
    }

    /// Validate the request, commit the `pending` batch, and assemble
    /// the engine job.
    ///
    /// Every error path here happens before OR instead of the batch
    /// insert, so a failed request leaves zero run rows behind.
    pub async fn prepare(&self, request: RunRequest) -> Result<PreparedRun, CoreError> {
        let detail = self.modules.get(request.module_id).await?;

        let ids = request
            .test_case_ids
            .as_deref()
            .filter(|ids| !ids.is_empty());
        let test_cases = self
            .modules
            .resolved_test_cases(request.module_id, ids)
            .await?;

        if let Some(requested) = ids {
            if test_cases.len() != requested.len() {
                return Err(CoreError::Validation(format!(
                    "test case selection contains ids that do not belong to module {}",
                    request.module_id
                )));
            }
        }

        // Credential resolution is a hard precondition: resolve before
        // any run row exists.
        let api_key = self.resolve_api_key(&request.implementation).await?;

        let methods = detail.module.grading_methods.clone();
        let entries: Vec<NewTestRun> = test_cases
            .iter()
            .flat_map(|tc| {
                methods.iter().map(|method| NewTestRun {
                    test_case_id: tc.id,
                    grading_method: *method,
                })
            })
            .collect();

        let test_run_ids = self.runs.create_batch(&entries).await?;

        let default_prompt = detail.system_prompt.as_ref().map(|p| p.content.clone());
        let job = EvaluationJob {
            test_cases: test_cases
                .iter()
                .map(|tc| JobCase {
                    id: tc.id,
                    prompt: tc.prompt.clone(),
                    expected_response: tc.expected_response.clone(),
                    system_prompt: tc
                        .system_prompt_content
                        .clone()
                        .or_else(|| default_prompt.clone()),
                })
                .collect(),
            model_implementation: request.implementation,
            specific_model: request.model,
            api_key,
            grading_methods: methods,
        };

        info!(
            module_id = request.module_id,
            runs = test_run_ids.len(),
            "test run batch queued"
        );

        Ok(PreparedRun {
            test_run_ids,
            job,
            module_id: request.module_id,
            system_prompt_id: detail.module.system_prompt_id,
            system_prompt_content: default_prompt,
        })
    }

    /// Drive a prepared run to a terminal state.
    ///
    /// Never returns an error: the HTTP response has already been sent,
    /// so every failure is recovered into `failed` run status and a log
    /// line. The job payload is never logged - it carries the
    /// credential.
    pub async fn execute(&self, prepared: PreparedRun) {
        let run_ids = &prepared.test_run_ids;

        if let Err(e) = self.runs.mark_running(run_ids).await {
            warn!(error = %e, "failed to mark batch running; failing batch");
            self.fail_batch(run_ids).await;
            return;
        }

        let report = match self.engine.evaluate(&prepared.job).await {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, runs = run_ids.len(), "engine invocation failed");
                self.fail_batch(run_ids).await;
                return;
            }
        };

        match self.reconcile(&prepared, &report).await {
            Ok(()) => {
                // Pairs the engine silently omitted must not stay stuck
                // in `running`: sweep them to `failed`.
                match self.runs.fail_unresolved(run_ids).await {
                    Ok(0) => info!(runs = run_ids.len(), "test run batch completed"),
                    Ok(swept) => {
                        warn!(swept, "engine output omitted pairs; swept unresolved runs");
                    }
                    Err(e) => warn!(error = %e, "failed to sweep unresolved runs"),
                }
            }
            Err(e) => {
                warn!(error = %e, "reconciliation failed; failing batch");
                self.fail_batch(run_ids).await;
            }
        }
    }

    /// Cancel a run. Guarded: only `pending`/`running` rows transition
    /// to `failed`; cancelling a terminal run is a no-op that still
    /// reports the row's (terminal) status. Bookkeeping only - an
    /// in-flight engine invocation is not interrupted.
    pub async fn cancel_run(&self, run_id: i64) -> Result<RunStatus, CoreError> {
        let status = self.runs.cancel(run_id).await?;
        info!(run_id, status = %status, "test run cancelled");
        Ok(status)
    }

    async fn resolve_api_key(
        &self,
        implementation: &str,
    ) -> Result<crate::secrets::ApiKey, CoreError> {
        let model = match self.models.get_by_name(implementation).await {
            Ok(model) => model,
            Err(RepositoryError::NotFound(_)) => {
                return Err(CoreError::Validation(format!(
                    "Model implementation {implementation} not found"
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let record = self
            .models
            .api_key(model.id)
            .await?
            .filter(|record| record.is_present())
            .ok_or_else(|| {
                CoreError::Validation(format!("No API key found for {implementation}"))
            })?;

        self.vault.decrypt(&record).map_err(|_| {
            CoreError::Validation(format!("Stored API key for {implementation} is unusable"))
        })
    }

    async fn reconcile(
        &self,
        prepared: &PreparedRun,
        report: &EngineReport,
    ) -> Result<(), RepositoryError> {
        let mut completions = Vec::new();
        for case_report in &report.results {
            for (&method, evaluation) in &case_report.evaluation_result {
                completions.push(CompletedEvaluation {
                    test_case_id: case_report.test_case_id,
                    grading_method: method,
                    result: self.build_result(prepared, case_report, method, evaluation),
                });
            }
        }

        self.runs
            .complete_batch(&prepared.test_run_ids, &completions)
            .await
    }

    fn build_result(
        &self,
        prepared: &PreparedRun,
        case_report: &crate::ports::CaseReport,
        method: GradingMethod,
        evaluation: &crate::ports::CaseEvaluation,
    ) -> NewTestResult {
        NewTestResult {
            test_case_id: case_report.test_case_id,
            module_id: prepared.module_id,
            model_implementation: prepared.job.model_implementation.clone(),
            model_name: prepared.job.specific_model.clone(),
            prompt: case_report.prompt.clone(),
            model_response: case_report.model_response.clone(),
            reference_response: case_report.expected_response.clone(),
            grading_method: method,
            overall_score: evaluation.score,
            attribute_scores: ScoreDetail::from_engine_detail(method, &evaluation.details),
            system_prompt_id: prepared.system_prompt_id,
            system_prompt_content: prepared.system_prompt_content.clone(),
        }
    }

    async fn fail_batch(&self, run_ids: &[i64]) {
        if let Err(e) = self.runs.fail_unresolved(run_ids).await {
            warn!(error = %e, "failed to mark batch failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use crate::domain::{
        ActiveRun, ApiKeyRecord, CompletedRunGroup, GradingMethod, Module, ModuleDetail,
        ModuleUpdate, NewModelRegistration, NewModule, NewTestCase, ModelRegistration,
        ResolvedTestCase, SystemPrompt, TestCase, TestRun,
    };
    use crate::ports::{CaseEvaluation, CaseReport, EngineError, EvaluationJob};

    // ── Mock ports ──────────────────────────────────────────────────────

    struct MockModules {
        detail: ModuleDetail,
        cases: Vec<ResolvedTestCase>,
    }

    #[async_trait]
    impl ModuleRepository for MockModules {
        async fn list(&self) -> Result<Vec<Module>, RepositoryError> {
            Ok(vec![self.detail.module.clone()])
        }

        async fn get(&self, id: i64) -> Result<ModuleDetail, RepositoryError> {
            if id == self.detail.module.id {
                Ok(self.detail.clone())
            } else {
                Err(RepositoryError::NotFound(format!("Module {id}")))
            }
        }

        async fn create(&self, _: &NewModule) -> Result<Module, RepositoryError> {
            unimplemented!("not used by orchestrator tests")
        }

        async fn update(&self, _: i64, _: &ModuleUpdate) -> Result<Module, RepositoryError> {
            unimplemented!("not used by orchestrator tests")
        }

        async fn delete(&self, _: i64) -> Result<(), RepositoryError> {
            unimplemented!("not used by orchestrator tests")
        }

        async fn add_test_case(
            &self,
            _: i64,
            _: &NewTestCase,
        ) -> Result<TestCase, RepositoryError> {
            unimplemented!("not used by orchestrator tests")
        }

        async fn list_test_cases(&self, _: i64) -> Result<Vec<TestCase>, RepositoryError> {
            unimplemented!("not used by orchestrator tests")
        }

        async fn remove_test_case(&self, _: i64, _: i64) -> Result<(), RepositoryError> {
            unimplemented!("not used by orchestrator tests")
        }

        async fn resolved_test_cases(
            &self,
            _module_id: i64,
            ids: Option<&[i64]>,
        ) -> Result<Vec<ResolvedTestCase>, RepositoryError> {
            Ok(match ids {
                Some(ids) => self
                    .cases
                    .iter()
                    .filter(|tc| ids.contains(&tc.id))
                    .cloned()
                    .collect(),
                None => self.cases.clone(),
            })
        }
    }

    struct MockModels {
        registration: ModelRegistration,
        key_record: Option<ApiKeyRecord>,
    }

    #[async_trait]
    impl ModelRepository for MockModels {
        async fn list(&self) -> Result<Vec<ModelRegistration>, RepositoryError> {
            Ok(vec![self.registration.clone()])
        }

        async fn get_by_name(&self, name: &str) -> Result<ModelRegistration, RepositoryError> {
            if name == self.registration.name {
                Ok(self.registration.clone())
            } else {
                Err(RepositoryError::NotFound(format!("Model '{name}'")))
            }
        }

        async fn upsert(
            &self,
            _: &NewModelRegistration,
        ) -> Result<ModelRegistration, RepositoryError> {
            unimplemented!("not used by orchestrator tests")
        }

        async fn api_key(&self, _: i64) -> Result<Option<ApiKeyRecord>, RepositoryError> {
            Ok(self.key_record.clone())
        }

        async fn store_api_key(&self, _: i64, _: &ApiKeyRecord) -> Result<(), RepositoryError> {
            unimplemented!("not used by orchestrator tests")
        }
    }

    #[derive(Default)]
    struct MockRuns {
        rows: Mutex<Vec<(i64, NewTestRun, RunStatus)>>,
        results: Mutex<Vec<NewTestResult>>,
    }

    impl MockRuns {
        fn statuses(&self) -> Vec<RunStatus> {
            self.rows.lock().unwrap().iter().map(|r| r.2).collect()
        }

        fn status_of(&self, run_id: i64) -> RunStatus {
            self.rows
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.0 == run_id)
                .map(|r| r.2)
                .unwrap()
        }

        fn result_count(&self) -> usize {
            self.results.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl RunRepository for MockRuns {
        async fn create_batch(
            &self,
            entries: &[NewTestRun],
        ) -> Result<Vec<i64>, RepositoryError> {
            let mut rows = self.rows.lock().unwrap();
            let mut ids = Vec::with_capacity(entries.len());
            for entry in entries {
                let id = rows.len() as i64 + 1;
                rows.push((id, entry.clone(), RunStatus::Pending));
                ids.push(id);
            }
            Ok(ids)
        }

        async fn mark_running(&self, run_ids: &[i64]) -> Result<(), RepositoryError> {
            let mut rows = self.rows.lock().unwrap();
            for row in rows.iter_mut() {
                if run_ids.contains(&row.0) && row.2 == RunStatus::Pending {
                    row.2 = RunStatus::Running;
                }
            }
            Ok(())
        }

        async fn complete_batch(
            &self,
            run_ids: &[i64],
            completions: &[CompletedEvaluation],
        ) -> Result<(), RepositoryError> {
            let mut rows = self.rows.lock().unwrap();
            let mut results = self.results.lock().unwrap();
            for completion in completions {
                let matched = rows.iter_mut().find(|(id, entry, status)| {
                    run_ids.contains(id)
                        && entry.test_case_id == completion.test_case_id
                        && entry.grading_method == completion.grading_method
                        && !status.is_terminal()
                });
                if let Some(row) = matched {
                    row.2 = RunStatus::Completed;
                    results.push(completion.result.clone());
                }
            }
            Ok(())
        }

        async fn fail_unresolved(&self, run_ids: &[i64]) -> Result<u64, RepositoryError> {
            let mut rows = self.rows.lock().unwrap();
            let mut swept = 0;
            for row in rows.iter_mut() {
                if run_ids.contains(&row.0) && !row.2.is_terminal() {
                    row.2 = RunStatus::Failed;
                    swept += 1;
                }
            }
            Ok(swept)
        }

        async fn cancel(&self, run_id: i64) -> Result<RunStatus, RepositoryError> {
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .iter_mut()
                .find(|r| r.0 == run_id)
                .ok_or_else(|| RepositoryError::NotFound(format!("Test run {run_id}")))?;
            if !row.2.is_terminal() {
                row.2 = RunStatus::Failed;
            }
            Ok(row.2)
        }

        async fn get(&self, _: i64) -> Result<TestRun, RepositoryError> {
            unimplemented!("not used by orchestrator tests")
        }

        async fn list_active(&self) -> Result<Vec<ActiveRun>, RepositoryError> {
            unimplemented!("not used by orchestrator tests")
        }

        async fn completed_digest(
            &self,
            _: u32,
        ) -> Result<Vec<CompletedRunGroup>, RepositoryError> {
            unimplemented!("not used by orchestrator tests")
        }
    }

    struct MockEngine {
        reply: Mutex<Option<Result<EngineReport, EngineError>>>,
        invoked: Mutex<bool>,
    }

    impl MockEngine {
        fn with_reply(reply: Result<EngineReport, EngineError>) -> Self {
            Self {
                reply: Mutex::new(Some(reply)),
                invoked: Mutex::new(false),
            }
        }

        fn was_invoked(&self) -> bool {
            *self.invoked.lock().unwrap()
        }
    }

    #[async_trait]
    impl EvaluationEngine for MockEngine {
        async fn evaluate(&self, _job: &EvaluationJob) -> Result<EngineReport, EngineError> {
            *self.invoked.lock().unwrap() = true;
            self.reply
                .lock()
                .unwrap()
                .take()
                .expect("engine invoked more than once")
        }
    }

    // ── Fixtures ────────────────────────────────────────────────────────

    fn fixture_modules() -> MockModules {
        let module = Module {
            id: 1,
            name: "Summarization".to_string(),
            description: Some("Summarize support tickets".to_string()),
            purpose: None,
            relevance: None,
            system_prompt_id: Some(9),
            grading_methods: vec![GradingMethod::Bleu, GradingMethod::Rouge],
        };
        MockModules {
            detail: ModuleDetail {
                module,
                system_prompt: Some(SystemPrompt {
                    id: 9,
                    name: "default".to_string(),
                    content: "You are concise.".to_string(),
                    created_at: chrono::Utc::now(),
                }),
                test_cases: vec![],
            },
            cases: vec![
                ResolvedTestCase {
                    id: 11,
                    prompt: "Summarize A".to_string(),
                    expected_response: "A summary".to_string(),
                    system_prompt_id: None,
                    system_prompt_content: None,
                },
                ResolvedTestCase {
                    id: 12,
                    prompt: "Summarize B".to_string(),
                    expected_response: "B summary".to_string(),
                    system_prompt_id: Some(5),
                    system_prompt_content: Some("Be formal.".to_string()),
                },
            ],
        }
    }

    fn fixture_models(vault: &KeyVault, with_key: bool) -> MockModels {
        MockModels {
            registration: ModelRegistration {
                id: 3,
                name: "openai".to_string(),
                kind: "chat".to_string(),
                description: String::new(),
                config: json!({}),
            },
            key_record: with_key.then(|| vault.encrypt("sk-test").unwrap()),
        }
    }

    fn full_report() -> EngineReport {
        let mut results = Vec::new();
        for (case_id, prompt) in [(11, "Summarize A"), (12, "Summarize B")] {
            let mut evaluation_result = BTreeMap::new();
            for method in [GradingMethod::Bleu, GradingMethod::Rouge] {
                evaluation_result.insert(
                    method,
                    CaseEvaluation {
                        score: 0.8,
                        details: json!({"fmeasure": 0.8}),
                    },
                );
            }
            results.push(CaseReport {
                test_case_id: case_id,
                prompt: prompt.to_string(),
                model_response: "response".to_string(),
                expected_response: "expected".to_string(),
                evaluation_result,
            });
        }
        EngineReport { results }
    }

    struct Harness {
        orchestrator: Arc<RunOrchestrator>,
        runs: Arc<MockRuns>,
    }

    fn harness(with_key: bool, reply: Result<EngineReport, EngineError>) -> Harness {
        let vault = Arc::new(KeyVault::from_master_secret("test-secret"));
        let runs = Arc::new(MockRuns::default());
        let engine = Arc::new(MockEngine::with_reply(reply));
        let orchestrator = Arc::new(RunOrchestrator::new(
            Arc::new(fixture_modules()),
            Arc::new(fixture_models(&vault, with_key)),
            runs.clone(),
            engine,
            vault,
        ));
        Harness { orchestrator, runs }
    }

    fn request() -> RunRequest {
        RunRequest {
            module_id: 1,
            test_case_ids: None,
            implementation: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
        }
    }

    // ── Tests ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn creates_the_full_cross_product_as_pending() {
        let h = harness(true, Ok(full_report()));
        let prepared = h.orchestrator.prepare(request()).await.unwrap();

        // 2 test cases x 2 grading methods
        assert_eq!(prepared.test_run_ids.len(), 4);
        assert!(h.runs.statuses().iter().all(|s| *s == RunStatus::Pending));
    }

    #[tokio::test]
    async fn effective_system_prompt_prefers_the_case_override() {
        let h = harness(true, Ok(full_report()));
        let prepared = h.orchestrator.prepare(request()).await.unwrap();

        let by_id = |id: i64| {
            prepared
                .job
                .test_cases
                .iter()
                .find(|c| c.id == id)
                .unwrap()
                .system_prompt
                .clone()
        };
        assert_eq!(by_id(11), Some("You are concise.".to_string()));
        assert_eq!(by_id(12), Some("Be formal.".to_string()));
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_any_run_exists() {
        let h = harness(false, Ok(full_report()));
        let err = h.orchestrator.prepare(request()).await.unwrap_err();

        assert!(matches!(err, CoreError::Validation(_)));
        assert!(h.runs.statuses().is_empty());
    }

    #[tokio::test]
    async fn unknown_module_is_not_found_with_no_side_effects() {
        let h = harness(true, Ok(full_report()));
        let err = h
            .orchestrator
            .prepare(RunRequest {
                module_id: 99,
                ..request()
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CoreError::Repository(RepositoryError::NotFound(_))
        ));
        assert!(h.runs.statuses().is_empty());
    }

    #[tokio::test]
    async fn foreign_test_case_ids_are_rejected() {
        let h = harness(true, Ok(full_report()));
        let err = h
            .orchestrator
            .prepare(RunRequest {
                test_case_ids: Some(vec![11, 777]),
                ..request()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Validation(_)));
        assert!(h.runs.statuses().is_empty());
    }

    #[tokio::test]
    async fn successful_run_completes_every_pair_and_writes_results() {
        let h = harness(true, Ok(full_report()));
        let prepared = h.orchestrator.prepare(request()).await.unwrap();
        h.orchestrator.execute(prepared).await;

        assert!(h.runs.statuses().iter().all(|s| *s == RunStatus::Completed));
        assert_eq!(h.runs.result_count(), 4);
    }

    #[tokio::test]
    async fn engine_reported_failure_fails_the_whole_batch() {
        let h = harness(
            true,
            Err(EngineError::Reported("rate limited".to_string())),
        );
        let prepared = h.orchestrator.prepare(request()).await.unwrap();
        h.orchestrator.execute(prepared).await;

        assert!(h.runs.statuses().iter().all(|s| *s == RunStatus::Failed));
        assert_eq!(h.runs.result_count(), 0);
    }

    #[tokio::test]
    async fn silently_missing_pair_is_swept_to_failed() {
        let mut report = full_report();
        // Drop ROUGE for test case 11 from the output map.
        report.results[0]
            .evaluation_result
            .remove(&GradingMethod::Rouge);

        let h = harness(true, Ok(report));
        let prepared = h.orchestrator.prepare(request()).await.unwrap();
        h.orchestrator.execute(prepared).await;

        let statuses = h.runs.statuses();
        assert_eq!(
            statuses.iter().filter(|s| **s == RunStatus::Completed).count(),
            3
        );
        assert_eq!(
            statuses.iter().filter(|s| **s == RunStatus::Failed).count(),
            1
        );
        assert_eq!(h.runs.result_count(), 3);
    }

    #[tokio::test]
    async fn cancelled_run_stays_failed_even_when_the_engine_completes_it() {
        let h = harness(true, Ok(full_report()));
        let prepared = h.orchestrator.prepare(request()).await.unwrap();
        let cancelled_id = prepared.test_run_ids[0];

        let status = h.orchestrator.cancel_run(cancelled_id).await.unwrap();
        assert_eq!(status, RunStatus::Failed);

        h.orchestrator.execute(prepared).await;

        assert_eq!(h.runs.status_of(cancelled_id), RunStatus::Failed);
        // No result row for the cancelled pair.
        assert_eq!(h.runs.result_count(), 3);
    }

    #[tokio::test]
    async fn cancellation_is_idempotent() {
        let h = harness(true, Ok(full_report()));
        let prepared = h.orchestrator.prepare(request()).await.unwrap();
        let id = prepared.test_run_ids[0];

        assert_eq!(h.orchestrator.cancel_run(id).await.unwrap(), RunStatus::Failed);
        assert_eq!(h.orchestrator.cancel_run(id).await.unwrap(), RunStatus::Failed);
    }

    #[tokio::test]
    async fn cancelling_an_unknown_run_is_not_found() {
        let h = harness(true, Ok(full_report()));
        assert!(matches!(
            h.orchestrator.cancel_run(404).await.unwrap_err(),
            CoreError::Repository(RepositoryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn empty_batch_skips_the_engine_entirely() {
        // Module with no grading methods assigned.
        let vault = Arc::new(KeyVault::from_master_secret("test-secret"));
        let mut modules = fixture_modules();
        modules.detail.module.grading_methods.clear();
        let runs = Arc::new(MockRuns::default());
        let engine = Arc::new(MockEngine::with_reply(Ok(full_report())));
        let orchestrator = Arc::new(RunOrchestrator::new(
            Arc::new(modules),
            Arc::new(fixture_models(&vault, true)),
            runs.clone(),
            engine.clone(),
            vault,
        ));

        let ids = orchestrator.create_run(request()).await.unwrap();
        assert!(ids.is_empty());
        assert!(!engine.was_invoked());
    }

    #[test]
    fn prepared_run_debug_never_reveals_the_credential() {
        let job = EvaluationJob {
            test_cases: vec![],
            model_implementation: "openai".to_string(),
            specific_model: "gpt".to_string(),
            api_key: crate::secrets::ApiKey::new("sk-very-secret".to_string()),
            grading_methods: vec![],
        };
        let rendered = format!("{job:?}");
        assert!(!rendered.contains("sk-very-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
