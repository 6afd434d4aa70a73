//! Remote tool abstraction and the tool catalog.
//!
//! Tools are remote capabilities exposed by upstream tool-provider
//! services (GitHub operations, security scanners, chart rendering).
//! The catalog is the ordered, read-only set discovered at startup;
//! per-query routing works on cheap descriptor copies and narrows the
//! catalog to a subset before the runtime ever sees it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;
use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// Lightweight metadata about a tool, as the routing layer sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// The unique tool name (e.g., "github_list_dependabot_alerts")
    pub name: String,

    /// Human-readable description of what the tool does
    pub description: String,
}

/// A request to invoke a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the LLM's tool_call.id)
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as a JSON value
    pub arguments: serde_json::Value,
}

/// An invocable remote tool.
///
/// Implementations wrap an upstream tool-provider endpoint. The routing
/// layer never calls `invoke`; it only reads descriptors. Invocation
/// happens inside the agent runtime once a query has been routed.
#[async_trait]
pub trait RemoteTool: Send + Sync {
    /// The unique name of this tool.
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    /// Invoke the tool with the given arguments.
    async fn invoke(&self, arguments: serde_json::Value) -> std::result::Result<String, ToolError>;

    /// Cheap metadata copy for the routing layer.
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
        }
    }

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// An ordered, read-only catalog of remote tools.
///
/// Registration order is preserved; duplicate names keep the first
/// registration. After startup the catalog is only read, so it is
/// shared freely behind `Arc` without locking.
pub struct ToolCatalog {
    tools: Vec<Arc<dyn RemoteTool>>,
    by_name: HashMap<String, usize>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Register a tool. The first registration of a name wins.
    pub fn register(&mut self, tool: Arc<dyn RemoteTool>) {
        let name = tool.name().to_string();
        if self.by_name.contains_key(&name) {
            warn!(tool = %name, "Duplicate tool registration ignored");
            return;
        }
        self.by_name.insert(name, self.tools.len());
        self.tools.push(tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn RemoteTool>> {
        self.by_name.get(name).map(|&i| &self.tools[i])
    }

    /// Descriptors for every tool, in registration order.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|t| t.descriptor()).collect()
    }

    /// Tool definitions for every tool (for sending to the LLM).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// Narrow the catalog to the named tools, preserving catalog order.
    /// Names that don't resolve are silently skipped.
    pub fn subset(&self, names: &[String]) -> ToolCatalog {
        let wanted: std::collections::HashSet<&str> =
            names.iter().map(|s| s.as_str()).collect();
        let mut sub = ToolCatalog::new();
        for tool in &self.tools {
            if wanted.contains(tool.name()) {
                sub.register(tool.clone());
            }
        }
        sub
    }

    /// Invoke a tool call against the catalog.
    pub async fn invoke(&self, call: &ToolCall) -> std::result::Result<String, ToolError> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;
        tool.invoke(call.arguments.clone()).await
    }

    /// List all registered tool names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A fixed-output tool for unit tests.
    struct StaticTool {
        name: &'static str,
        description: &'static str,
    }

    #[async_trait]
    impl RemoteTool for StaticTool {
        fn name(&self) -> &str { self.name }
        fn description(&self) -> &str { self.description }
        async fn invoke(&self, _arguments: serde_json::Value) -> std::result::Result<String, ToolError> {
            Ok(format!("{} ok", self.name))
        }
    }

    fn catalog() -> ToolCatalog {
        let mut cat = ToolCatalog::new();
        cat.register(Arc::new(StaticTool { name: "github_list_repos", description: "List repositories" }));
        cat.register(Arc::new(StaticTool { name: "security_scan", description: "Scan for vulnerabilities" }));
        cat.register(Arc::new(StaticTool { name: "chart_render", description: "Render a chart" }));
        cat
    }

    #[test]
    fn descriptors_preserve_registration_order() {
        let names: Vec<String> = catalog().descriptors().into_iter().map(|d| d.name).collect();
        assert_eq!(names, ["github_list_repos", "security_scan", "chart_render"]);
    }

    #[test]
    fn duplicate_registration_keeps_first() {
        let mut cat = catalog();
        cat.register(Arc::new(StaticTool {
            name: "security_scan",
            description: "A different description",
        }));
        assert_eq!(cat.len(), 3);
        assert_eq!(cat.get("security_scan").unwrap().description(), "Scan for vulnerabilities");
    }

    #[test]
    fn subset_preserves_catalog_order() {
        let cat = catalog();
        let sub = cat.subset(&["chart_render".into(), "github_list_repos".into()]);
        assert_eq!(sub.names(), ["github_list_repos", "chart_render"]);
    }

    #[test]
    fn subset_skips_unknown_names() {
        let sub = catalog().subset(&["nonexistent".into(), "security_scan".into()]);
        assert_eq!(sub.len(), 1);
    }

    #[tokio::test]
    async fn invoke_resolves_tool() {
        let cat = catalog();
        let call = ToolCall {
            id: "call_1".into(),
            name: "github_list_repos".into(),
            arguments: serde_json::json!({}),
        };
        let out = cat.invoke(&call).await.unwrap();
        assert_eq!(out, "github_list_repos ok");
    }

    #[tokio::test]
    async fn invoke_missing_tool() {
        let cat = ToolCatalog::new();
        let call = ToolCall {
            id: "call_1".into(),
            name: "nonexistent".into(),
            arguments: serde_json::json!({}),
        };
        let err = cat.invoke(&call).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }
}
