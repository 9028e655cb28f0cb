//! Subprocess implementation of the `EvaluationEngine` port.
//!
//! Protocol: the job document is written to the child's stdin as one
//! JSON object, then stdin is closed to signal end of input. The child
//! writes one result document to stdout and exits. Exit code 0 plus a
//! parseable `success:true` document is the only success path; any
//! other combination is a typed failure.
//!
//! There is no cancellation channel: once dispatched, the engine runs
//! to completion on its own. `kill_on_drop` only prevents an abandoned
//! invocation from leaking a process.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use evalhub_core::ports::{EngineError, EngineReport, EvaluationEngine, EvaluationJob};

/// How to invoke the engine process.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Program to execute (e.g. the evaluation venv's python).
    pub program: PathBuf,
    /// Arguments (e.g. the runner script path).
    pub args: Vec<String>,
    /// Working directory for the child, if any.
    pub working_dir: Option<PathBuf>,
}

impl EngineConfig {
    /// Create a config for the given program.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    /// Set the argument list.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the working directory.
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

/// Subprocess-backed evaluation engine.
pub struct SubprocessEngine {
    config: EngineConfig,
}

impl SubprocessEngine {
    /// Create a new subprocess engine with the given invocation config.
    #[must_use]
    pub const fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl EvaluationEngine for SubprocessEngine {
    async fn evaluate(&self, job: &EvaluationJob) -> Result<EngineReport, EngineError> {
        debug!(
            program = %self.config.program.display(),
            test_cases = job.test_cases.len(),
            "invoking evaluation engine"
        );

        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &self.config.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| EngineError::SpawnFailed(e.to_string()))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::Io("missing stdin handle".to_string()))?;

        let document = serde_json::to_vec(&job.to_stdin_document())
            .map_err(|e| EngineError::Io(e.to_string()))?;
        stdin
            .write_all(&document)
            .await
            .map_err(|e| EngineError::Io(e.to_string()))?;
        // Closing stdin signals "no more input" to the engine
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| EngineError::Io(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(EngineError::NonZeroExit {
                status: output
                    .status
                    .code()
                    .map_or_else(|| "signal".to_string(), |c| c.to_string()),
                stderr,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        EngineReport::from_document(stdout.trim())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use evalhub_core::secrets::ApiKey;
    use evalhub_core::{GradingMethod, JobCase};

    fn job() -> EvaluationJob {
        EvaluationJob {
            test_cases: vec![JobCase {
                id: 1,
                prompt: "2+2?".to_string(),
                expected_response: "4".to_string(),
                system_prompt: Some("You are terse.".to_string()),
            }],
            model_implementation: "openai".to_string(),
            specific_model: "gpt-4o-mini".to_string(),
            api_key: ApiKey::new("sk-test".to_string()),
            grading_methods: vec![GradingMethod::Bleu],
        }
    }

    fn shell_engine(script: &str) -> SubprocessEngine {
        SubprocessEngine::new(EngineConfig::new("/bin/sh").with_args(["-c", script]))
    }

    #[tokio::test]
    async fn success_document_round_trips() {
        let engine = shell_engine(
            r#"cat > /dev/null; printf '%s' '{
                "success": true,
                "results": [{
                    "test_case_id": 1,
                    "prompt": "2+2?",
                    "model_response": "4",
                    "expected_response": "4",
                    "evaluation_result": {"BLEU": {"score": 1.0, "details": {}}}
                }]
            }'"#,
        );

        let report = engine.evaluate(&job()).await.unwrap();
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].test_case_id, 1);
    }

    #[tokio::test]
    async fn stdin_receives_the_job_document() {
        // The fake engine fails unless the payload carries the key,
        // proving the stdin framing works end to end.
        let engine = shell_engine(
            r#"input=$(cat); case "$input" in
                *sk-test*) printf '%s' '{"success": true, "results": []}';;
                *) echo "no key" >&2; exit 9;;
            esac"#,
        );

        assert!(engine.evaluate(&job()).await.is_ok());
    }

    #[tokio::test]
    async fn nonzero_exit_carries_stderr() {
        let engine = shell_engine("cat > /dev/null; echo boom >&2; exit 3");

        let err = engine.evaluate(&job()).await.unwrap_err();
        match err {
            EngineError::NonZeroExit { status, stderr } => {
                assert_eq!(status, "3");
                assert_eq!(stderr, "boom");
            }
            other => panic!("expected NonZeroExit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn reported_failure_with_clean_exit() {
        let engine = shell_engine(
            r#"cat > /dev/null; printf '%s' '{"success": false, "error": "rate limited"}'"#,
        );

        let err = engine.evaluate(&job()).await.unwrap_err();
        assert!(matches!(err, EngineError::Reported(msg) if msg == "rate limited"));
    }

    #[tokio::test]
    async fn garbage_output_is_malformed() {
        let engine = shell_engine("cat > /dev/null; echo 'Traceback (most recent call last):'");

        let err = engine.evaluate(&job()).await.unwrap_err();
        assert!(matches!(err, EngineError::MalformedOutput(_)));
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_failure() {
        let engine =
            SubprocessEngine::new(EngineConfig::new("/nonexistent/evaluation-engine"));

        let err = engine.evaluate(&job()).await.unwrap_err();
        assert!(matches!(err, EngineError::SpawnFailed(_)));
    }
}
