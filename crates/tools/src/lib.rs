//! Remote tool-server client for Agentry.
//!
//! One `ToolServerClient` per configured server. Clients discover the
//! server's tool listing lazily, cache it, and dispatch calls against the
//! cache; an explicit `discover_tools()` refreshes it.

pub mod client;

pub use client::ToolServerClient;

use std::collections::HashSet;
use std::sync::Arc;

use agentry_config::RuntimeConfig;
use agentry_core::ToolSource;
use tracing::warn;

/// Build one tool client per configured server.
///
/// Dispatch later searches these in configuration order, first match wins;
/// tool names are expected to be unique across servers, so a duplicate here
/// would make a server unreachable for that name. That is a deployment
/// problem and only worth a warning at call time, not a runtime decision.
pub fn tool_sources_from_config(config: &RuntimeConfig) -> Vec<Arc<dyn ToolSource>> {
    if !config.tools_enabled {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    config
        .tool_servers
        .iter()
        .filter(|server| {
            if seen.insert(server.name.clone()) {
                true
            } else {
                warn!(server = %server.name, "Duplicate tool server name in configuration, ignoring");
                false
            }
        })
        .map(|server| {
            Arc::new(ToolServerClient::new(
                &server.name,
                &server.url,
                config.tool_timeout_secs,
            )) as Arc<dyn ToolSource>
        })
        .collect()
}
