//! Peer agents and the delegation seam.
//!
//! A peer is another agent runtime reachable over HTTP. Peers are provided
//! externally through configuration; this layer only invokes them and
//! (optionally) reads their discovery cards.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DelegationError;

/// An agent discovery card, served at `/.well-known/agent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCard {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// The base URL tasks should be sent to
    #[serde(default)]
    pub url: String,

    /// Tool descriptors this agent can use
    #[serde(default)]
    pub skills: Vec<serde_json::Value>,

    /// Coarse capability flags ("tool_execution", "task_delegation", ...)
    #[serde(default)]
    pub capabilities: Vec<String>,
}

/// Name and best-known description of a peer, for prompt assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerSummary {
    pub name: String,
    pub description: String,
}

/// Routes delegated sub-tasks to peer agents.
#[async_trait]
pub trait PeerRouter: Send + Sync {
    /// Known peers with their best-known descriptions.
    async fn peer_summaries(&self) -> Vec<PeerSummary>;

    /// Send `task` (plus an optional bounded context summary) to the named
    /// peer and return its answer. Any text response is a success; a peer is
    /// never wrong, only unreachable or slow.
    async fn delegate(
        &self,
        peer_name: &str,
        task: &str,
        context: Option<&str>,
    ) -> std::result::Result<String, DelegationError>;
}
