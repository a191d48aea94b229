//! Tool descriptors and the tool-server seam.
//!
//! Tools are named external capabilities hosted on remote tool servers. The
//! runtime never executes tool code itself; it discovers descriptors from a
//! server's listing endpoint and dispatches calls to that server. Tool
//! inventories are typed descriptor lists resolved from static configuration,
//! never executable definitions evaluated at runtime.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;

/// A tool advertised by a remote tool server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// The tool name, unique within its server
    pub name: String,

    /// Description of what the tool does (sent to the model)
    #[serde(default)]
    pub description: String,

    /// JSON Schema describing the tool's accepted arguments
    #[serde(default)]
    pub parameters: serde_json::Value,

    /// The server this tool was discovered from
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub server_url: String,
}

/// A source of tools: one remote tool server.
///
/// The runtime holds one `ToolSource` per configured server and searches
/// across all of them by tool name when dispatching a call; the first server
/// advertising the name wins.
#[async_trait]
pub trait ToolSource: Send + Sync {
    /// A label identifying this source (the configured server name).
    fn label(&self) -> &str;

    /// The advertised tools, served from cache after first discovery.
    async fn list_tools(&self) -> Vec<ToolDescriptor>;

    /// Invoke a tool by name with the given arguments.
    async fn call_tool(
        &self,
        name: &str,
        args: serde_json::Value,
    ) -> std::result::Result<serde_json::Value, ToolError>;
}
