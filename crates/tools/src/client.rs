//! HTTP client for one remote tool server.
//!
//! Tool servers differ in where they mount their endpoints, so both
//! discovery and calls walk a small fallback chain (`/mcp/...`, bare,
//! `/v1/...`), treating 404 as "try the next one". Listings may be a bare
//! JSON array or wrapped in `{"tools": [...]}`.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use agentry_core::error::ToolError;
use agentry_core::tool::{ToolDescriptor, ToolSource};

const DISCOVERY_ENDPOINTS: &[&str] = &["/mcp/tools", "/tools", "/v1/tools"];
const CALL_ENDPOINTS: &[&str] = &["/mcp/call", "/call", "/v1/call"];

/// A client for one remote tool server, with a lazily-populated tool cache.
pub struct ToolServerClient {
    name: String,
    base_url: String,
    timeout_secs: u64,
    client: reqwest::Client,
    cache: RwLock<Option<Vec<ToolDescriptor>>>,
}

impl ToolServerClient {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout_secs,
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(timeout_secs))
                .build()
                .expect("failed to build HTTP client"),
            cache: RwLock::new(None),
        }
    }

    /// Query the server's tool listing and replace the cache. Idempotent.
    pub async fn discover_tools(&self) -> Result<Vec<ToolDescriptor>, ToolError> {
        let mut last_error = None;

        for endpoint in DISCOVERY_ENDPOINTS {
            let url = format!("{}{}", self.base_url, endpoint);
            match self.client.get(&url).send().await {
                Ok(response) if response.status().as_u16() == 404 => continue,
                Ok(response) if !response.status().is_success() => {
                    last_error = Some(ToolError::Remote {
                        tool_name: self.name.clone(),
                        reason: format!("discovery returned HTTP {}", response.status().as_u16()),
                    });
                }
                Ok(response) => {
                    let body: serde_json::Value =
                        response.json().await.map_err(|e| ToolError::Remote {
                            tool_name: self.name.clone(),
                            reason: format!("invalid discovery response: {e}"),
                        })?;
                    let tools = self.parse_listing(body);
                    debug!(server = %self.name, count = tools.len(), "Discovered tools");
                    *self.cache.write().await = Some(tools.clone());
                    return Ok(tools);
                }
                Err(e) => {
                    last_error = Some(self.transport_error(&self.name, e));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ToolError::Remote {
            tool_name: self.name.clone(),
            reason: "no tool discovery endpoint found".into(),
        }))
    }

    /// Accept a bare array or a `{"tools": [...]}` wrapper; drop entries
    /// without a name.
    fn parse_listing(&self, body: serde_json::Value) -> Vec<ToolDescriptor> {
        let entries = match body {
            serde_json::Value::Array(entries) => entries,
            serde_json::Value::Object(mut map) => match map.remove("tools") {
                Some(serde_json::Value::Array(entries)) => entries,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };

        entries
            .into_iter()
            .filter_map(|entry| {
                let mut tool: ToolDescriptor = serde_json::from_value(entry).ok()?;
                if tool.name.is_empty() {
                    warn!(server = %self.name, "Skipping tool listing entry with empty name");
                    return None;
                }
                tool.server_url = self.base_url.clone();
                Some(tool)
            })
            .collect()
    }

    /// The cached tools, discovering first when the cache is empty.
    async fn cached_or_discover(&self) -> Result<Vec<ToolDescriptor>, ToolError> {
        if let Some(tools) = self.cache.read().await.as_ref() {
            return Ok(tools.clone());
        }
        self.discover_tools().await
    }

    fn transport_error(&self, tool_name: &str, err: reqwest::Error) -> ToolError {
        if err.is_timeout() {
            ToolError::Timeout {
                tool_name: tool_name.to_string(),
                timeout_secs: self.timeout_secs,
            }
        } else {
            ToolError::Remote {
                tool_name: tool_name.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl ToolSource for ToolServerClient {
    fn label(&self) -> &str {
        &self.name
    }

    async fn list_tools(&self) -> Vec<ToolDescriptor> {
        match self.cached_or_discover().await {
            Ok(tools) => tools,
            Err(e) => {
                warn!(server = %self.name, error = %e, "Tool discovery failed");
                Vec::new()
            }
        }
    }

    async fn call_tool(
        &self,
        name: &str,
        args: serde_json::Value,
    ) -> Result<serde_json::Value, ToolError> {
        let tools = self.cached_or_discover().await?;
        if !tools.iter().any(|t| t.name == name) {
            return Err(ToolError::NotFound(name.to_string()));
        }

        let payload = serde_json::json!({
            "tool": name,
            "arguments": args,
        });

        let mut last_error = None;
        for endpoint in CALL_ENDPOINTS {
            let url = format!("{}{}", self.base_url, endpoint);
            match self.client.post(&url).json(&payload).send().await {
                Ok(response) if response.status().as_u16() == 404 => continue,
                Ok(response) if !response.status().is_success() => {
                    let status = response.status().as_u16();
                    let body = response.text().await.unwrap_or_default();
                    return Err(ToolError::Remote {
                        tool_name: name.to_string(),
                        reason: format!("HTTP {status}: {body}"),
                    });
                }
                Ok(response) => {
                    let mut body: serde_json::Value =
                        response.json().await.map_err(|e| ToolError::Remote {
                            tool_name: name.to_string(),
                            reason: format!("invalid call response: {e}"),
                        })?;
                    debug!(server = %self.name, tool = name, "Tool call succeeded");
                    // Unwrap {"result": ...}; anything else comes back verbatim.
                    return Ok(match body.get_mut("result") {
                        Some(result) => result.take(),
                        None => body,
                    });
                }
                Err(e) => {
                    last_error = Some(self.transport_error(name, e));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ToolError::Remote {
            tool_name: name.to_string(),
            reason: "no tool call endpoint found".into(),
        }))
    }
}
