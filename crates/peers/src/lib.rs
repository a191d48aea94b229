//! Peer-agent registry and delegation router for Agentry.
//!
//! Peers are other agent runtimes, provided externally through
//! configuration. Delegation forwards a sub-task (plus a bounded context
//! summary) to a peer's invocation endpoint and takes any text answer as the
//! result; a peer can be unreachable or slow, never wrong.

pub mod router;

pub use router::{DelegationRouter, PeerAgent};

use std::sync::Arc;

use agentry_config::RuntimeConfig;
use agentry_core::PeerRouter;

/// Build the delegation router from configuration.
pub fn router_from_config(config: &RuntimeConfig) -> Arc<dyn PeerRouter> {
    let peers = if config.delegation_enabled {
        config
            .peer_agents
            .iter()
            .map(|p| PeerAgent::new(&p.name, &p.url, &p.description))
            .collect()
    } else {
        Vec::new()
    };
    Arc::new(DelegationRouter::new(peers, config.delegation_timeout_secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(extra: &[(&str, &str)]) -> RuntimeConfig {
        let mut vars = vec![
            ("MODEL_API_URL", "http://localhost:11434"),
            ("MODEL_NAME", "test-model"),
        ];
        vars.extend_from_slice(extra);
        RuntimeConfig::from_lookup(|key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
        .unwrap()
    }

    #[tokio::test]
    async fn disabled_delegation_has_no_peers() {
        let cfg = config(&[
            ("DELEGATION_ENABLED", "false"),
            ("PEER_AGENTS", "worker-1"),
            ("PEER_AGENT_WORKER_1_URL", "http://worker-1:8080"),
        ]);
        let router = router_from_config(&cfg);
        assert!(router.peer_summaries().await.is_empty());
    }

    #[tokio::test]
    async fn configured_peers_are_listed() {
        let cfg = config(&[
            ("PEER_AGENTS", "worker-1,worker-2"),
            ("PEER_AGENT_WORKER_1_URL", "http://worker-1:8080"),
            ("PEER_AGENT_WORKER_1_DESCRIPTION", "Handles math"),
            ("PEER_AGENT_WORKER_2_URL", "http://worker-2:8080"),
        ]);
        let router = router_from_config(&cfg);
        let summaries = router.peer_summaries().await;
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].name, "worker-1");
        assert_eq!(summaries[0].description, "Handles math");
    }
}
