//! End-to-end integration tests for the Agentgate pipeline.
//!
//! These exercise the full path from an HTTP query to the final
//! response: routing, agent selection, prompt assembly, the reasoning
//! loop with tool execution, and the resilience fallbacks.

use std::sync::Arc;

use agentgate_config::AppConfig;
use agentgate_core::error::{ProviderError, ToolError};
use agentgate_core::message::{Message, MessageToolCall};
use agentgate_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use agentgate_core::{RemoteTool, ToolCatalog};
use agentgate_gateway::{AppContext, build_router};

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;

// --- Mock provider ---

/// Returns scripted responses in sequence.
struct ScriptedProvider {
    responses: std::sync::Mutex<Vec<ProviderResponse>>,
}

impl ScriptedProvider {
    fn new(mut responses: Vec<ProviderResponse>) -> Self {
        responses.reverse();
        Self {
            responses: std::sync::Mutex::new(responses),
        }
    }

    fn text(content: &str) -> ProviderResponse {
        ProviderResponse {
            message: Message::assistant(content),
            usage: Some(Usage {
                prompt_tokens: 50,
                completion_tokens: 20,
                total_tokens: 70,
            }),
            model: "scripted".into(),
        }
    }

    fn tool_call(name: &str, arguments: &str) -> ProviderResponse {
        let mut message = Message::assistant("");
        message.tool_calls = vec![MessageToolCall {
            id: "call_1".into(),
            name: name.into(),
            arguments: arguments.into(),
        }];
        ProviderResponse {
            message,
            usage: Some(Usage {
                prompt_tokens: 40,
                completion_tokens: 10,
                total_tokens: 50,
            }),
            model: "scripted".into(),
        }
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        _request: ProviderRequest,
    ) -> Result<ProviderResponse, ProviderError> {
        self.responses
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| ProviderError::Network("script exhausted".into()))
    }
}

/// Always fails with a plain network error.
struct BrokenProvider;

#[async_trait::async_trait]
impl Provider for BrokenProvider {
    fn name(&self) -> &str {
        "broken"
    }

    async fn complete(
        &self,
        _request: ProviderRequest,
    ) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::Network("upstream unreachable".into()))
    }
}

// --- Mock tool ---

struct ScanTool;

#[async_trait::async_trait]
impl RemoteTool for ScanTool {
    fn name(&self) -> &str {
        "security_scan"
    }

    fn description(&self) -> &str {
        "Scan a repository for vulnerabilities"
    }

    async fn invoke(&self, _arguments: serde_json::Value) -> Result<String, ToolError> {
        Ok(r#"{"findings": 2, "severity": "high"}"#.into())
    }
}

// --- Helpers ---

fn fast_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.retry.max_retries = 0;
    config.retry.min_spacing_ms = 0;
    config
}

fn app(provider: Arc<dyn Provider>, config: AppConfig) -> axum::Router {
    let mut catalog = ToolCatalog::new();
    catalog.register(Arc::new(ScanTool));
    let context = AppContext::new(config, provider, Arc::new(catalog)).unwrap();
    build_router(Arc::new(context))
}

fn post_query(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/query")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// --- Tests ---

#[tokio::test]
async fn full_pipeline_with_tool_execution() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        ScriptedProvider::tool_call("security_scan", r#"{"repo":"demo/app"}"#),
        ScriptedProvider::text("The scan found 2 high severity issues."),
    ]));
    let app = app(provider, fast_config());

    let response = app
        .oneshot(post_query(serde_json::json!({
            "query": "run a snyk scan on demo/app"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(
        body["response"],
        "The scan found 2 high severity issues."
    );
    assert_eq!(body["demo_mode"], false);
    // "snyk" hits the dispatch pattern for the Snyk scanner agent.
    assert_eq!(body["agents_used"][0], "snyk_scanner_agent");
    // Two LLM turns: 50 + 70 tokens.
    assert_eq!(body["usage"]["total_tokens"], 120);
}

#[tokio::test]
async fn keyword_fallback_routes_unpatterned_query() {
    let provider = Arc::new(ScriptedProvider::new(vec![ScriptedProvider::text(
        "Here is your answer.",
    )]));
    let app = app(provider, fast_config());

    // No dispatch pattern matches; keyword scoring picks the agents.
    let response = app
        .oneshot(post_query(serde_json::json!({
            "query": "show recent github commit activity"
        })))
        .await
        .unwrap();

    let body = json_body(response).await;
    assert_eq!(body["demo_mode"], false);
    assert_eq!(body["agents_used"][0], "github_agent");
}

#[tokio::test]
async fn breaker_opens_and_serves_demo_response() {
    let mut config = fast_config();
    config.breaker.failure_threshold = 1;
    let app = app(Arc::new(BrokenProvider), config);

    // First query trips the breaker.
    let first = app
        .clone()
        .oneshot(post_query(serde_json::json!({ "query": "hello" })))
        .await
        .unwrap();
    let first_body = json_body(first).await;
    assert_eq!(first_body["demo_mode"], false);
    assert!(
        first_body["response"]
            .as_str()
            .unwrap()
            .contains("upstream unreachable")
    );

    // Second query is rejected by the open breaker and degrades to
    // the demo responder.
    let second = app
        .clone()
        .oneshot(post_query(serde_json::json!({ "query": "hello again" })))
        .await
        .unwrap();
    let second_body = json_body(second).await;
    assert_eq!(second_body["demo_mode"], true);
    assert!(
        second_body["response"]
            .as_str()
            .unwrap()
            .contains("Demo Mode Active")
    );

    // The breakers endpoint reflects the open state.
    let snapshot = app
        .oneshot(
            Request::builder()
                .uri("/v1/breakers")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let snapshot_body = json_body(snapshot).await;
    assert_eq!(snapshot_body[0]["state"], "open");
}
