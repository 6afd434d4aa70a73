//! HTTP gateway for Agentgate.
//!
//! One pipeline per query: route (pattern fast path or relevance
//! fallback), optimize the agent selection, assemble a bounded prompt,
//! then execute the runtime under the circuit breaker and retry
//! policy. Execution failures degrade to the demo responder; the query
//! handler itself never returns a 500 for an agent failure.

use axum::{
    Router,
    extract::State,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use agentgate_agent::{BoundAgent, DemoResponder, PromptAssembler, RuntimeResult};
use agentgate_config::{AppConfig, ConfigError};
use agentgate_core::error::ProviderError;
use agentgate_core::{AgentCatalog, Provider, ToolCatalog, Usage};
use agentgate_resilience::{
    BreakerConfig, BreakerError, BreakerRegistry, BreakerSnapshot, RetryPolicy,
};
use agentgate_routing::{AgentSelector, QueryRouter};

/// Everything a request handler needs, built once at startup.
///
/// No ambient globals: the context owns the compiled routing tables,
/// the provider, the tool catalog, and the resilience state, and is
/// shared behind `Arc`.
pub struct AppContext {
    pub config: AppConfig,
    pub provider: Arc<dyn Provider>,
    pub catalog: Arc<ToolCatalog>,
    pub agents: AgentCatalog,
    pub router: QueryRouter,
    pub selector: AgentSelector,
    pub breakers: BreakerRegistry,
    pub retry: RetryPolicy,
}

pub type SharedContext = Arc<AppContext>;

impl AppContext {
    /// Assemble the context from validated configuration and the
    /// already-constructed provider and tool catalog.
    pub fn new(
        config: AppConfig,
        provider: Arc<dyn Provider>,
        catalog: Arc<ToolCatalog>,
    ) -> Result<Self, ConfigError> {
        let router = QueryRouter::from_config(&config.routing)?;
        let selector = AgentSelector::from_config(&config.routing);
        let agents = config.routing.agent_catalog();

        let breakers = BreakerRegistry::new(BreakerConfig {
            failure_threshold: config.breaker.failure_threshold,
            recovery_timeout: Duration::from_secs(config.breaker.recovery_timeout_secs),
            success_threshold: config.breaker.success_threshold,
            call_timeout: Duration::from_secs(config.breaker.call_timeout_secs),
        });
        let retry = RetryPolicy::new(
            config.retry.max_retries,
            Duration::from_millis(config.retry.base_delay_ms),
            Duration::from_millis(config.retry.min_spacing_ms),
        );

        Ok(Self {
            config,
            provider,
            catalog,
            agents,
            router,
            selector,
            breakers,
            retry,
        })
    }
}

/// Build the Axum router with all gateway routes.
pub fn build_router(context: SharedContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/query", post(query_handler))
        .route("/v1/breakers", get(breakers_handler))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(context)
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let provider = agentgate_providers::provider_from_settings(&config.provider);
    let catalog = Arc::new(agentgate_providers::catalog_from_config(&config.tools));

    info!(
        provider = %provider.name(),
        tools = catalog.len(),
        agents = config.routing.agents.len(),
        "Building application context"
    );

    let context = Arc::new(AppContext::new(config, provider, catalog)?);
    let app = build_router(context);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn breakers_handler(State(ctx): State<SharedContext>) -> Json<Vec<BreakerSnapshot>> {
    Json(ctx.breakers.all_snapshots().await)
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    /// The natural-language query
    pub query: String,

    /// Explicitly requested agents; inferred from the query if absent
    #[serde(default)]
    pub agents: Option<Vec<String>>,

    /// Summary of any uploaded documents, for prompt context
    #[serde(default)]
    pub document_summary: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub response: String,
    pub agents_used: Vec<String>,
    pub usage: Option<Usage>,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
    pub demo_mode: bool,
}

async fn query_handler(
    State(ctx): State<SharedContext>,
    Json(payload): Json<QueryRequest>,
) -> Json<QueryResponse> {
    info!(query_len = payload.query.len(), "Query received");

    // 1. Route: fast path or relevance fallback.
    let descriptors = ctx.catalog.descriptors();
    let plan = ctx.router.route(&payload.query, &descriptors, &ctx.agents);

    // 2. Optimize the agent selection. Explicitly requested agents
    //    take precedence over inferred ones.
    let requested = payload.agents.clone().unwrap_or_else(|| plan.agents.clone());
    let selection = ctx.selector.optimize(&requested, &ctx.agents);

    // 3. Assemble the bounded prompt over the narrowed tool subset.
    let prompt = PromptAssembler::build(
        &plan.tools,
        &selection.agents,
        payload.document_summary.is_some(),
        payload.document_summary.as_deref(),
    );

    let tool_names: Vec<String> = plan.tools.iter().map(|d| d.name.clone()).collect();
    let subset = Arc::new(ctx.catalog.subset(&tool_names));

    let agent = BoundAgent::bind(
        selection
            .agents
            .first()
            .cloned()
            .unwrap_or_else(|| "dynamic_agent".into()),
        ctx.provider.clone(),
        ctx.config.provider.default_model.clone(),
        subset,
        prompt,
        plan.speed.clone(),
    );

    // 4. Execute under the breaker, with rate-limit retry inside.
    let breaker = ctx.breakers.get_or_create("agent_execution");
    let timeout = Duration::from_secs(plan.speed.timeout_secs);
    let query = payload.query.clone();
    let outcome: Result<RuntimeResult, BreakerError<ProviderError>> = breaker
        .call_with_timeout(timeout, ctx.retry.call(|| agent.run(&query)))
        .await;

    let mut warnings = selection.warnings;
    let agents_used = selection.agents;

    let response = match outcome {
        Ok(result) => {
            info!(
                iterations = result.iterations,
                tool_calls = result.tool_calls_made,
                "Query completed"
            );
            QueryResponse {
                response: result.answer,
                agents_used,
                usage: result.usage,
                warnings,
                recommendations: selection.recommendations,
                demo_mode: false,
            }
        }
        Err(
            e @ (BreakerError::Open { .. }
            | BreakerError::Timeout { .. }
            | BreakerError::RateLimited { .. }),
        ) => {
            warn!(error = %e, "Execution unavailable, falling back to demo responder");
            warnings.push(format!("Live execution unavailable: {e}"));
            QueryResponse {
                response: DemoResponder::respond(&payload.query),
                agents_used,
                usage: None,
                warnings,
                recommendations: selection.recommendations,
                demo_mode: true,
            }
        }
        Err(BreakerError::Failed { inner, .. }) => {
            error!(error = %inner, "Agent execution failed");
            QueryResponse {
                response: format!("Error processing query: {inner}"),
                agents_used,
                usage: None,
                warnings,
                recommendations: selection.recommendations,
                demo_mode: false,
            }
        }
    };

    Json(response)
}
