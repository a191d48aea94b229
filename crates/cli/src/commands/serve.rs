//! The `serve` command: run the gateway.

use agentry_config::RuntimeConfig;
use tracing::info;

pub async fn run(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = RuntimeConfig::from_env()?;
    if let Some(port) = port {
        config.port = port;
    }

    info!(
        agent = %config.agent_name,
        model = %config.model_name,
        tool_servers = config.tool_servers.len(),
        peers = config.peer_agents.len(),
        "Starting Agentry runtime"
    );

    agentry_gateway::serve(config).await
}
