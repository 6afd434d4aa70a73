//! System prompt assembly.
//!
//! Every assembled prompt is bounded: tool lists are reduced to bare
//! names, document summaries are hard-truncated, and the whole text is
//! measured against an absolute character ceiling. A huge upstream
//! tool catalog can never blow the model's context window. Output is
//! deterministic for identical inputs.

use agentgate_core::ToolDescriptor;
use tracing::warn;

/// Most tool names listed in the prompt.
const MAX_TOOL_NAMES: usize = 6;

/// Hard cap on an attached document summary.
const SUMMARY_CHAR_LIMIT: usize = 800;

/// Absolute ceiling on the assembled prompt.
const PROMPT_CHAR_CEILING: usize = 6000;

/// Tool names kept in the emergency fallback prompt.
const EMERGENCY_TOOL_NAMES: usize = 5;

const SUMMARY_TRUNCATION_MARKER: &str =
    "\n\n[Summary truncated. Use document tools for full content.]";

/// Characters held back from the ceiling for the truncation marker.
const PROMPT_TRUNCATION_RESERVE: usize = 100;

const PROMPT_TRUNCATION_MARKER: &str = "\n\n[Prompt truncated]";

/// Builds bounded system prompts from the selected agents and tools.
pub struct PromptAssembler;

impl PromptAssembler {
    /// Assemble the instruction text for a request.
    ///
    /// `agent_names` are the optimized selection (first name becomes
    /// the persona). The document summary is only included when
    /// non-GitHub agents are active, since the GitHub agents never
    /// consume document context.
    pub fn build(
        descriptors: &[ToolDescriptor],
        agent_names: &[String],
        has_document_context: bool,
        document_summary: Option<&str>,
    ) -> String {
        let tool_names: Vec<&str> = descriptors
            .iter()
            .take(MAX_TOOL_NAMES)
            .map(|d| bare_name(&d.name))
            .collect();
        let tools_line = tool_names.join(", ");

        let persona = agent_names
            .first()
            .map(String::as_str)
            .unwrap_or("dynamic_agent");

        let mut prompt = format!(
            "You are an expert assistant with access to specialized tools. \
             You are using the {persona} agent.\n\
             \n\
             EFFICIENCY GUIDELINES:\n\
             1. Choose the MOST SPECIFIC tool for the task on your FIRST attempt\n\
             2. For GitHub operations, prefer exact tools (e.g., list_dependabot_alerts) over generic ones\n\
             3. Once you get good results from a tool, format and present them immediately\n\
             4. Avoid calling multiple similar tools - one good result is sufficient\n\
             5. STOP as soon as you have answered the user's question completely\n\
             \n\
             Available tools: {tools_line}\n"
        );

        if has_document_context && wants_document_context(agent_names) {
            let summary = document_summary
                .unwrap_or("Documents have been processed and are available.");
            prompt.push_str("\nDocument context: ");
            prompt.push_str(&truncate_summary(summary));
            prompt.push('\n');
        }

        prompt.push_str(
            "\nFocus on being accurate and efficient. \
             Present results in clear tables when appropriate.\n",
        );

        if prompt.chars().count() > PROMPT_CHAR_CEILING {
            warn!(
                chars = prompt.chars().count(),
                ceiling = PROMPT_CHAR_CEILING,
                "Assembled prompt over ceiling, using emergency template"
            );
            prompt = emergency_prompt(descriptors);
        }

        enforce_ceiling(prompt)
    }
}

/// Hard-cap the final text at the ceiling. Even the emergency template
/// can be blown up by a single enormous tool name, so the cap is
/// applied to whatever text is about to leave the assembler.
fn enforce_ceiling(prompt: String) -> String {
    if prompt.chars().count() <= PROMPT_CHAR_CEILING {
        return prompt;
    }
    warn!(
        chars = prompt.chars().count(),
        ceiling = PROMPT_CHAR_CEILING,
        "Prompt still over ceiling, hard truncating"
    );
    let mut truncated: String = prompt
        .chars()
        .take(PROMPT_CHAR_CEILING - PROMPT_TRUNCATION_RESERVE)
        .collect();
    truncated.push_str(PROMPT_TRUNCATION_MARKER);
    truncated
}

/// Reduce a tool description line to its bare name: everything before
/// the first colon or opening parenthesis.
fn bare_name(raw: &str) -> &str {
    let end = raw
        .find([':', '('])
        .unwrap_or(raw.len());
    raw[..end].trim()
}

/// At least one active agent that is not a GitHub specialist.
fn wants_document_context(agent_names: &[String]) -> bool {
    agent_names.iter().any(|name| !name.contains("github"))
}

fn truncate_summary(summary: &str) -> String {
    if summary.chars().count() <= SUMMARY_CHAR_LIMIT {
        return summary.to_string();
    }
    warn!(
        chars = summary.chars().count(),
        limit = SUMMARY_CHAR_LIMIT,
        "Document summary truncated"
    );
    let mut truncated: String = summary.chars().take(SUMMARY_CHAR_LIMIT).collect();
    truncated.push_str(SUMMARY_TRUNCATION_MARKER);
    truncated
}

/// Minimal prompt used when the assembled text exceeds the ceiling.
fn emergency_prompt(descriptors: &[ToolDescriptor]) -> String {
    let names: Vec<&str> = descriptors
        .iter()
        .take(EMERGENCY_TOOL_NAMES)
        .map(|d| bare_name(&d.name))
        .collect();
    format!(
        "You are a helpful AI assistant with access to tools: {}. \
         Use them to answer questions effectively.",
        names.join(", ")
    )
}
