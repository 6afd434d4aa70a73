//! `agentgate gateway`: start the HTTP gateway server.

use anyhow::Context;
use tracing::info;

pub async fn run(port: Option<u16>) -> anyhow::Result<()> {
    let mut config =
        agentgate_config::AppConfig::load().context("failed to load configuration")?;

    if let Some(port) = port {
        config.gateway.port = port;
    }

    if config.provider.api_key.is_none() {
        tracing::warn!(
            "No API key configured - set AGENTGATE_API_KEY or add provider.api_key to agentgate.toml"
        );
    }

    info!(
        host = %config.gateway.host,
        port = config.gateway.port,
        model = %config.provider.default_model,
        "Starting Agentgate gateway"
    );

    agentgate_gateway::start(config).await
}
