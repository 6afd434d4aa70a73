//! `agentgate check`: validate configuration before deployment.

use agentgate_config::AppConfig;
use std::path::Path;

pub fn run(path: &Path) -> anyhow::Result<()> {
    println!("Agentgate configuration check");
    println!("=============================\n");

    if !path.exists() {
        println!("  No config file at {} - defaults will be used", path.display());
    }

    let config = match AppConfig::load_from(path) {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ {e}");
            return Err(e.into());
        }
    };

    println!("  ✅ {} agents configured", config.routing.agents.len());
    println!("  ✅ {} categories", config.routing.categories.len());
    println!(
        "  ✅ {} dispatch patterns compiled",
        config.routing.patterns.len()
    );
    println!("  ✅ {} tool endpoints", config.tools.len());
    println!("     max_agents = {}", config.routing.max_agents);
    println!(
        "     provider = {} ({})",
        config.provider.name, config.provider.default_model
    );

    if config.provider.api_key.is_none() && std::env::var("AGENTGATE_API_KEY").is_err() {
        println!("\n  ⚠️  No API key configured - the gateway will start but provider calls will fail");
    }

    println!("\n  All checks passed");
    Ok(())
}
