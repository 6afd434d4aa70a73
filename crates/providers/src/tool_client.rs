//! HTTP client for remote tool endpoints.
//!
//! Each configured tool endpoint accepts a JSON body of arguments via
//! POST and returns its result as the response body. The routing layer
//! decides which of these tools a request may see; invocation happens
//! in the agent runtime.

use agentgate_config::ToolEndpoint;
use agentgate_core::error::ToolError;
use agentgate_core::{RemoteTool, ToolCatalog};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A remote tool backed by an HTTP endpoint.
pub struct HttpRemoteTool {
    name: String,
    description: String,
    endpoint: String,
    client: reqwest::Client,
}

impl HttpRemoteTool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: name.into(),
            description: description.into(),
            endpoint: endpoint.into(),
            client,
        }
    }

    pub fn from_endpoint(endpoint: &ToolEndpoint) -> Self {
        Self::new(&endpoint.name, &endpoint.description, &endpoint.endpoint)
    }
}

#[async_trait]
impl RemoteTool for HttpRemoteTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn invoke(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<String, ToolError> {
        debug!(tool = %self.name, endpoint = %self.endpoint, "Invoking remote tool");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&arguments)
            .send()
            .await
            .map_err(|e| ToolError::InvocationFailed {
                tool_name: self.name.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            warn!(tool = %self.name, status = status.as_u16(), "Remote tool returned error");
            return Err(ToolError::InvocationFailed {
                tool_name: self.name.clone(),
                reason: format!("HTTP {status}: {body}"),
            });
        }

        Ok(body)
    }
}

/// Build the startup tool catalog from configured endpoints.
pub fn catalog_from_config(endpoints: &[ToolEndpoint]) -> ToolCatalog {
    let mut catalog = ToolCatalog::new();
    for endpoint in endpoints {
        catalog.register(Arc::new(HttpRemoteTool::from_endpoint(endpoint)));
    }
    catalog
}
