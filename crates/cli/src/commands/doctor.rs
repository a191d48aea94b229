//! The `doctor` command: configuration summary and reachability checks.

use agentry_config::RuntimeConfig;
use agentry_core::ModelBackend;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = match RuntimeConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            println!("✗ Configuration: {e}");
            return Err(e.into());
        }
    };

    println!("Agentry doctor");
    println!();
    println!("  agent:        {}", config.agent_name);
    println!("  model:        {} @ {}", config.model_name, config.model_api_url);
    println!("  memory:       {:?} (enabled: {})", config.memory_type, config.memory_enabled);
    println!(
        "  limits:       {} sessions x {} events, {} steps, {} context events",
        config.max_sessions,
        config.max_events_per_session,
        config.max_reasoning_steps,
        config.context_window_size
    );
    println!();

    // Model reachability
    let model = agentry_providers::ModelClient::new(
        &config.model_api_url,
        &config.model_name,
        config.model_api_key.clone(),
    );
    if model.health_check().await {
        println!("✓ Model API reachable: {}", config.model_api_url);
    } else {
        println!("✗ Model API unreachable: {}", config.model_api_url);
    }

    // Tool servers
    if config.tool_servers.is_empty() {
        println!("- No tool servers configured");
    }
    for server in &config.tool_servers {
        let client = agentry_tools::ToolServerClient::new(
            &server.name,
            &server.url,
            config.tool_timeout_secs,
        );
        match client.discover_tools().await {
            Ok(tools) => {
                println!("✓ Tool server '{}': {} tools at {}", server.name, tools.len(), server.url);
            }
            Err(e) => println!("✗ Tool server '{}': {e}", server.name),
        }
    }

    // Peer agents
    if config.peer_agents.is_empty() {
        println!("- No peer agents configured");
    } else {
        let router = agentry_peers::DelegationRouter::new(
            config
                .peer_agents
                .iter()
                .map(|p| agentry_peers::PeerAgent::new(&p.name, &p.url, &p.description))
                .collect(),
            config.delegation_timeout_secs,
        );
        for peer in &config.peer_agents {
            match router.discover(&peer.name).await {
                Some(card) => println!("✓ Peer '{}': {}", peer.name, card.description),
                None => println!("✗ Peer '{}': no card at {}", peer.name, peer.url),
            }
        }
    }

    Ok(())
}
