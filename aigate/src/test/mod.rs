//! End-to-end tests: a full application against a mock inference API and a temp output directory.

use axum::http::StatusCode;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::test_utils::{TestContext, mount_upstream_image};

const GENERATE: &str = "/ai/run/@cf/lykon/dreamshaper-8-lcm";
const CLASSIFY: &str = "/ai/run/@cf/microsoft/resnet-50";
const SUMMARIZE: &str = "/ai/run/@cf/facebook/bart-large-cnn";

#[tokio::test]
#[test_log::test]
async fn test_generate_saves_returned_image() {
    let ctx = TestContext::new().await;
    let png = b"\x89PNG\r\n\x1a\nfake image body".to_vec();
    Mock::given(method("POST"))
        .and(path(GENERATE))
        .and(header("authorization", "Bearer test-token"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({
            "prompt": "cat",
            "negative_prompt": "blurry, low quality",
            "height": 512,
            "width": 512,
            "num_steps": 20,
            "guidance": 7.5
        })))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png.clone()))
        .expect(1)
        .mount(&ctx.upstream)
        .await;

    let response = ctx.server.post("/generate").json(&json!({"prompt": "cat"})).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert!(body.get("image_b64").is_none());

    let saved = body["path"].as_str().unwrap();
    let filename = std::path::Path::new(saved).file_name().unwrap().to_str().unwrap();
    assert!(filename.starts_with("generated_"));
    assert!(filename.ends_with(".png"));
    assert_eq!(ctx.saved_files(), vec![filename.to_string()]);
    assert_eq!(std::fs::read(saved).unwrap(), png);
}

#[tokio::test]
#[test_log::test]
async fn test_judge_returns_classification() {
    let ctx = TestContext::new().await;
    Mock::given(method("POST"))
        .and(path(CLASSIFY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [
                {"label": "tabby", "score": 0.9},
                {"label": "tiger cat", "score": 0.05}
            ]
        })))
        .expect(1)
        .mount(&ctx.upstream)
        .await;

    let response = ctx.server.post("/judge").bytes(b"\x89PNG image".to_vec().into()).await;

    response.assert_status_ok();
    response.assert_json(&json!({
        "success": true,
        "result": [
            {"label": "tabby", "score": 0.9},
            {"label": "tiger cat", "score": 0.05}
        ]
    }));
    assert!(ctx.saved_files().is_empty());
}

#[tokio::test]
#[test_log::test]
async fn test_summarize_cleans_summary() {
    let ctx = TestContext::new().await;
    Mock::given(method("POST"))
        .and(path(SUMMARIZE))
        .and(body_partial_json(json!({"input_text": "long text", "max_length": 1024})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": {"summary": "A\nB"}})))
        .expect(1)
        .mount(&ctx.upstream)
        .await;

    let response = ctx.server.post("/summarize").json(&json!({"text": "long text"})).await;

    response.assert_status_ok();
    response.assert_json(&json!({"summary": "A B"}));
}

#[tokio::test]
#[test_log::test]
async fn test_missing_prompt_never_reaches_upstream() {
    let ctx = TestContext::new().await;
    mount_upstream_image(&ctx.upstream, GENERATE, b"unused", 0).await;

    let response = ctx.server.post("/generate").json(&json!({})).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({"success": false, "error": "Prompt is required"}));
    assert!(ctx.saved_files().is_empty());
}

#[tokio::test]
#[test_log::test]
async fn test_upstream_failure_persists_nothing() {
    let ctx = TestContext::new().await;
    Mock::given(method("POST"))
        .and(path(GENERATE))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(1)
        .mount(&ctx.upstream)
        .await;

    let response = ctx.server.post("/generate").json(&json!({"prompt": "x"})).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("503"));
    assert!(error.contains("Service Unavailable"));
    assert!(ctx.saved_files().is_empty());
}

#[tokio::test]
#[test_log::test]
async fn test_summarize_upstream_failure_uses_bare_envelope() {
    let ctx = TestContext::new().await;
    Mock::given(method("POST"))
        .and(path(SUMMARIZE))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(1)
        .mount(&ctx.upstream)
        .await;

    let response = ctx.server.post("/summarize").json(&json!({"text": "long text"})).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    response.assert_json(&json!({"error": "API Error: 503 Service Unavailable"}));
}

#[tokio::test]
async fn test_unreachable_upstream_is_network_error() {
    let ctx = TestContext::with_config(|config| {
        // Nothing listens on the discard port
        config.upstream.base_url = "http://127.0.0.1:9/ai/run".to_string();
    })
    .await;

    let response = ctx.server.post("/generate").json(&json!({"prompt": "x"})).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    response.assert_json(&json!({"success": false, "error": "Failed to reach inference API"}));
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let ctx = TestContext::with_config(|config| config.limits.max_body_bytes = 16).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&ctx.upstream)
        .await;

    let response = ctx.server.post("/judge").bytes(vec![0u8; 64].into()).await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_root_and_health() {
    let ctx = TestContext::new().await;

    let root = ctx.server.get("/").await;
    root.assert_status_ok();
    root.assert_text("aigate is running");

    let health = ctx.server.get("/healthz").await;
    health.assert_status_ok();
    health.assert_text("OK");
}

#[tokio::test]
async fn test_openapi_document_served() {
    let ctx = TestContext::new().await;

    let response = ctx.server.get("/openapi.json").await;

    response.assert_status_ok();
    let doc: Value = response.json();
    assert_eq!(doc["info"]["title"], "aigate");
    assert!(doc["paths"]["/summarize"]["post"].is_object());
}

#[tokio::test]
async fn test_metrics_route_absent_when_disabled() {
    let ctx = TestContext::new().await;
    ctx.server.get("/internal/metrics").await.assert_status(StatusCode::NOT_FOUND);
}

// The Prometheus recorder is process-global, so only one test may enable metrics
#[tokio::test]
async fn test_metrics_route_when_enabled() {
    let ctx = TestContext::with_config(|config| config.enable_metrics = true).await;
    ctx.server.get("/healthz").await.assert_status_ok();

    let response = ctx.server.get("/internal/metrics").await;

    response.assert_status_ok();
}
