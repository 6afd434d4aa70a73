//! The agent reasoning loop: think, act, observe.

use agentgate_core::error::ProviderError;
use agentgate_core::{
    Conversation, Message, Provider, ProviderRequest, ToolCall, ToolCatalog, ToolDefinition,
    ToolDescriptor, Usage,
};
use agentgate_routing::SpeedConfig;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of one runtime invocation.
#[derive(Debug, Clone)]
pub struct RuntimeResult {
    /// The final text answer
    pub answer: String,

    /// Accumulated token usage across all LLM calls
    pub usage: Option<Usage>,

    /// How many loop iterations ran
    pub iterations: u32,

    /// How many tool calls were executed
    pub tool_calls_made: u32,
}

/// The reasoning loop bound to a provider, a tool subset, and a
/// per-request speed budget.
pub struct AgentRuntime {
    provider: Arc<dyn Provider>,
    model: String,
    tools: Arc<ToolCatalog>,
    system_prompt: String,
    speed: SpeedConfig,
    max_tokens: Option<u32>,
}

impl AgentRuntime {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        tools: Arc<ToolCatalog>,
        system_prompt: impl Into<String>,
        speed: SpeedConfig,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            tools,
            system_prompt: system_prompt.into(),
            speed,
            max_tokens: None,
        }
    }

    /// Set the maximum tokens per LLM response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Process a query and generate a response.
    ///
    /// Builds the conversation (system prompt + user query), calls the
    /// LLM, executes any requested tool calls, and loops until the LLM
    /// produces a plain text answer or the iteration budget runs out.
    pub async fn run(&self, query: &str) -> Result<RuntimeResult, ProviderError> {
        let mut conversation = Conversation::new();
        conversation.push(Message::system(&self.system_prompt));
        conversation.push(Message::user(query));

        let tool_definitions = self.clamped_definitions();
        let mut usage: Option<Usage> = None;
        let mut tool_calls_made = 0u32;

        info!(
            model = %self.model,
            tools = tool_definitions.len(),
            max_iterations = self.speed.max_iterations,
            "Starting agent runtime"
        );

        for iteration in 1..=self.speed.max_iterations {
            debug!(iteration, "Runtime iteration");

            let request = ProviderRequest {
                model: self.model.clone(),
                messages: conversation.messages.clone(),
                temperature: self.speed.temperature,
                max_tokens: self.max_tokens,
                tools: tool_definitions.clone(),
            };

            let response = self.provider.complete(request).await?;

            if let Some(turn_usage) = &response.usage {
                usage.get_or_insert_with(Usage::default).add(turn_usage);
            }

            if response.message.tool_calls.is_empty() {
                let answer = response.message.content.clone();
                conversation.push(response.message);
                return Ok(RuntimeResult {
                    answer,
                    usage,
                    iterations: iteration,
                    tool_calls_made,
                });
            }

            let tool_calls = response.message.tool_calls.clone();
            conversation.push(response.message);

            debug!(count = tool_calls.len(), "Executing tool calls");
            for tc in &tool_calls {
                tool_calls_made += 1;
                let call = ToolCall {
                    id: tc.id.clone(),
                    name: tc.name.clone(),
                    arguments: serde_json::from_str(&tc.arguments).unwrap_or_default(),
                };

                match self.tools.invoke(&call).await {
                    Ok(output) => {
                        conversation.push(Message::tool_result(&tc.id, &output));
                    }
                    Err(e) => {
                        warn!(tool = %tc.name, error = %e, "Tool invocation failed");
                        // Report the error so the LLM can recover.
                        conversation.push(Message::tool_result(&tc.id, &format!("Error: {e}")));
                    }
                }
            }
        }

        warn!(
            iterations = self.speed.max_iterations,
            "Max iterations reached, forcing text response"
        );
        Ok(RuntimeResult {
            answer: "I reached the maximum number of tool iterations for this request. \
                     Please narrow the question or ask for a specific result."
                .into(),
            usage,
            iterations: self.speed.max_iterations,
            tool_calls_made,
        })
    }

    /// Tool definitions with descriptions clamped to the speed budget.
    fn clamped_definitions(&self) -> Vec<ToolDefinition> {
        let limit = self.speed.description_char_limit;
        self.tools
            .definitions()
            .into_iter()
            .map(|mut def| {
                if def.description.chars().count() > limit {
                    def.description = def.description.chars().take(limit).collect();
                }
                def
            })
            .collect()
    }
}

/// One selected agent bound to its tool subset and assembled prompt.
///
/// The binding is explicit: everything the agent can see is captured
/// here at construction, so a request's routing decision is inspectable
/// after the fact.
pub struct BoundAgent {
    pub name: String,
    pub tools: Vec<ToolDescriptor>,
    pub prompt: String,
    runtime: AgentRuntime,
}

impl BoundAgent {
    pub fn bind(
        name: impl Into<String>,
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        catalog: Arc<ToolCatalog>,
        prompt: String,
        speed: SpeedConfig,
    ) -> Self {
        let tools = catalog.descriptors();
        let runtime = AgentRuntime::new(provider, model, catalog, prompt.clone(), speed);
        Self {
            name: name.into(),
            tools,
            prompt,
            runtime,
        }
    }

    pub async fn run(&self, query: &str) -> Result<RuntimeResult, ProviderError> {
        self.runtime.run(query).await
    }
}
