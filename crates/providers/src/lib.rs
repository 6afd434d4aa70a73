//! Provider and remote tool clients.

pub mod openai_compat;
pub mod tool_client;

pub use openai_compat::OpenAiCompatProvider;
pub use tool_client::{HttpRemoteTool, catalog_from_config};

use agentgate_config::ProviderSettings;
use agentgate_core::Provider;
use std::sync::Arc;
use std::time::Duration;

/// Build the configured LLM provider.
pub fn provider_from_settings(settings: &ProviderSettings) -> Arc<dyn Provider> {
    Arc::new(OpenAiCompatProvider::with_timeout(
        &settings.name,
        &settings.api_url,
        settings.api_key.as_deref().unwrap_or_default(),
        Duration::from_secs(settings.request_timeout_secs),
    ))
}
