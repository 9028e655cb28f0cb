//! Integration tests for the Axum web server.
//!
//! These tests drive the full stack - routes, services, SQLite store,
//! and a fake shell-script evaluation engine - through the public API.

#![cfg(unix)]

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use evalhub_axum::bootstrap::{CorsConfig, ServerConfig, bootstrap};
use evalhub_axum::routes::create_router;
use evalhub_engine::EngineConfig;

const MASTER_KEY: &str = "integration-master-secret";
const API_KEY: &str = "sk-integration-test-key";

/// Engine that consumes stdin and reports a BLEU score for test case 1.
const SUCCESS_ENGINE: &str = r#"cat > /dev/null; printf '%s' '{
    "success": true,
    "results": [{
        "test_case_id": 1,
        "prompt": "Summarize the ticket",
        "model_response": "A concise summary",
        "expected_response": "A concise summary",
        "evaluation_result": {
            "BLEU": {"score": 1.0, "details": {"reference_tokens": ["a"], "response_tokens": ["a"]}}
        }
    }]
}'"#;

/// Engine that fails wholesale with a nonzero exit.
const CRASHING_ENGINE: &str = "cat > /dev/null; echo 'engine exploded' >&2; exit 1";

async fn test_app(engine_script: &str) -> (Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        port: 0, // Not used in tests
        db_path: dir.path().join("evalhub.db"),
        engine: EngineConfig::new("/bin/sh").with_args(["-c", engine_script]),
        master_key: MASTER_KEY.to_string(),
        static_dir: None,
        cors: CorsConfig::AllowAll,
    };

    let ctx = bootstrap(config).await.unwrap();
    (create_router(ctx, &CorsConfig::AllowAll), dir)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Seed a prompt, a BLEU module with one test case, and a keyed model.
async fn seed(app: &Router, with_api_key: bool) {
    let (status, prompt) = send(
        app,
        "POST",
        "/api/system-prompts",
        Some(json!({"name": "default", "content": "You are concise."})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, module) = send(
        app,
        "POST",
        "/api/modules",
        Some(json!({
            "name": "Summarization",
            "description": "Summarize support tickets",
            "system_prompt_id": prompt["id"],
            "grading_methods": ["BLEU"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        app,
        "POST",
        &format!("/api/modules/{}/test-cases", module["id"]),
        Some(json!({
            "input": "Summarize the ticket",
            "reference_response": "A concise summary",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        app,
        "POST",
        "/api/models",
        Some(json!({"name": "openai", "type": "chat", "description": "OpenAI models"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    if with_api_key {
        let (status, _) = send(
            app,
            "POST",
            "/api/models/openai/api-key",
            Some(json!({"apiKey": API_KEY})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}

/// Poll `/api/runs` until no runs are active (the spec's only progress
/// channel is polling).
async fn wait_for_settled(app: &Router) -> Value {
    for _ in 0..100 {
        let (status, body) = send(app, "GET", "/api/runs", None).await;
        assert_eq!(status, StatusCode::OK);
        if body["activeRuns"].as_array().is_some_and(Vec::is_empty) {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("runs never settled");
}

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let (app, _dir) = test_app(SUCCESS_ENGINE).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn grading_methods_endpoint_lists_the_closed_set() {
    let (app, _dir) = test_app(SUCCESS_ENGINE).await;

    let (status, body) = send(&app, "GET", "/api/modules/grading-methods", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["BLEU", "ROUGE", "METEOR", "LLM_JUDGE"]));
}

#[tokio::test]
async fn run_tests_end_to_end_completes_and_stores_a_result() {
    let (app, _dir) = test_app(SUCCESS_ENGINE).await;
    seed(&app, true).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/modules/1/run-tests",
        Some(json!({"implementation": "openai", "model": "gpt-4o-mini"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["testRunIds"].as_array().unwrap().len(), 1);
    // The credential never leaks into the creation response
    assert!(!body.to_string().contains(API_KEY));

    let settled = wait_for_settled(&app).await;
    let completed = settled["completedRuns"].as_array().unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0]["status"], json!("completed"));
    assert_eq!(completed[0]["module_name"], json!("Summarization"));
    assert_eq!(completed[0]["test_case_count"], json!(1));
    assert_eq!(completed[0]["grading_methods"], json!(["BLEU"]));
    // ...nor into the status surface
    assert!(!settled.to_string().contains(API_KEY));

    let (status, results) = send(&app, "GET", "/api/results", None).await;
    assert_eq!(status, StatusCode::OK);
    let results = results.as_array().unwrap().clone();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["grading_method"], json!("BLEU"));
    assert_eq!(results[0]["overall_score"], json!(1.0));
    assert_eq!(results[0]["module_name"], json!("Summarization"));
    assert_eq!(results[0]["system_prompt_content"], json!("You are concise."));
    assert!(!Value::Array(results.clone()).to_string().contains(API_KEY));

    let result_id = results[0]["id"].as_i64().unwrap();
    let (status, detail) = send(&app, "GET", &format!("/api/results/{result_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["model_name"], json!("gpt-4o-mini"));
}

#[tokio::test]
async fn engine_failure_marks_the_whole_batch_failed() {
    let (app, _dir) = test_app(CRASHING_ENGINE).await;
    seed(&app, true).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/modules/1/run-tests",
        Some(json!({"implementation": "openai", "model": "gpt-4o-mini"})),
    )
    .await;
    // Fire-and-forget: creation succeeds even though evaluation will fail
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));

    let settled = wait_for_settled(&app).await;
    let completed = settled["completedRuns"].as_array().unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0]["status"], json!("failed"));

    let (_, results) = send(&app, "GET", "/api/results", None).await;
    assert!(results.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn missing_api_key_fails_synchronously_with_no_runs() {
    let (app, _dir) = test_app(SUCCESS_ENGINE).await;
    seed(&app, false).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/modules/1/run-tests",
        Some(json!({"implementation": "openai", "model": "gpt-4o-mini"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));

    let (_, runs) = send(&app, "GET", "/api/runs", None).await;
    assert!(runs["activeRuns"].as_array().unwrap().is_empty());
    assert!(runs["completedRuns"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_module_is_a_404() {
    let (app, _dir) = test_app(SUCCESS_ENGINE).await;
    seed(&app, true).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/modules/99/run-tests",
        Some(json!({"implementation": "openai", "model": "gpt-4o-mini"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cancellation_wins_over_a_late_completion() {
    // Engine sleeps long enough for the cancel to land first
    let slow_engine = format!("sleep 1; {SUCCESS_ENGINE}");
    let (app, _dir) = test_app(&slow_engine).await;
    seed(&app, true).await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/modules/1/run-tests",
        Some(json!({"implementation": "openai", "model": "gpt-4o-mini"})),
    )
    .await;
    let run_id = body["testRunIds"][0].as_i64().unwrap();

    let (status, cancel) = send(
        &app,
        "POST",
        &format!("/api/runs/{run_id}/cancel"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancel["success"], json!(true));

    // Cancellation is idempotent
    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/runs/{run_id}/cancel"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let settled = wait_for_settled(&app).await;
    let completed = settled["completedRuns"].as_array().unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0]["status"], json!("failed"));

    // The engine's late success must not resurrect the cancelled run
    let (_, results) = send(&app, "GET", "/api/results", None).await;
    assert!(results.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn cancelling_an_unknown_run_is_a_404() {
    let (app, _dir) = test_app(SUCCESS_ENGINE).await;

    let (status, _) = send(&app, "POST", "/api/runs/42/cancel", Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn module_crud_round_trip() {
    let (app, _dir) = test_app(SUCCESS_ENGINE).await;
    seed(&app, false).await;

    let (status, detail) = send(&app, "GET", "/api/modules/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["name"], json!("Summarization"));
    assert_eq!(detail["grading_methods"], json!(["BLEU"]));
    assert_eq!(detail["system_prompt"]["content"], json!("You are concise."));
    assert_eq!(detail["test_cases"].as_array().unwrap().len(), 1);

    let (status, updated) = send(
        &app,
        "PUT",
        "/api/modules/1",
        Some(json!({
            "name": "Summarization v2",
            "grading_methods": ["ROUGE", "LLM_JUDGE"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], json!("Summarization v2"));
    // Methods come back in stored (alphabetical) order
    assert_eq!(updated["grading_methods"], json!(["LLM_JUDGE", "ROUGE"]));

    let (status, _) = send(&app, "DELETE", "/api/modules/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", "/api/modules/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn api_key_store_and_fetch_round_trip() {
    let (app, _dir) = test_app(SUCCESS_ENGINE).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/models",
        Some(json!({"name": "anthropic", "type": "chat"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // No key stored yet
    let (status, body) = send(&app, "GET", "/api/models/anthropic/api-key", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["apiKey"], Value::Null);

    let (status, body) = send(
        &app,
        "POST",
        "/api/models/anthropic/api-key",
        Some(json!({"apiKey": "sk-ant-test"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["apiKey"], json!("sk-ant-test"));

    let (status, body) = send(&app, "GET", "/api/models/anthropic/api-key", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["apiKey"], json!("sk-ant-test"));

    // The registry listing never carries key material
    let (_, models) = send(&app, "GET", "/api/models", None).await;
    assert!(!models.to_string().contains("sk-ant-test"));
}
