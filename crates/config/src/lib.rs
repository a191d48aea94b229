//! Configuration loading and validation for Agentry.
//!
//! The runtime is deployed by an orchestration layer that owns all file and
//! flag surfaces; everything the runtime needs arrives as process
//! environment variables. `RuntimeConfig::from_env()` is the single entry
//! point, and validation runs at startup so a misconfigured replica fails
//! fast instead of failing mid-task.
//!
//! Named collections use an indirection pattern: `MCP_SERVERS=calc,web`
//! names the servers, and `MCP_SERVER_CALC_URL` / `MCP_SERVER_WEB_URL` give
//! each its endpoint. Peer agents follow the same shape with `PEER_AGENTS`
//! and `PEER_AGENT_<NAME>_URL` (+ optional `_DESCRIPTION`).

use serde::Serialize;

/// Which session-store backend to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    /// Bounded in-process store
    Local,
    /// Discard all writes, return empty reads
    None,
}

/// One configured remote tool server.
#[derive(Debug, Clone, Serialize)]
pub struct ToolServerConfig {
    pub name: String,
    pub url: String,
}

/// One configured peer agent.
#[derive(Debug, Clone, Serialize)]
pub struct PeerAgentConfig {
    pub name: String,
    pub url: String,
    pub description: String,
}

/// The complete runtime configuration.
#[derive(Clone, Serialize)]
pub struct RuntimeConfig {
    // --- Identity ---
    pub agent_name: String,
    pub agent_description: String,
    pub agent_instructions: String,
    pub port: u16,

    // --- Model ---
    pub model_api_url: String,
    #[serde(skip_serializing)]
    pub model_api_key: Option<String>,
    pub model_name: String,
    pub model_temperature: f32,
    pub model_max_tokens: Option<u32>,

    // --- Memory ---
    pub memory_enabled: bool,
    pub memory_type: MemoryType,
    pub context_window_size: usize,
    pub max_sessions: usize,
    pub max_events_per_session: usize,

    // --- Reasoning loop ---
    pub max_reasoning_steps: u32,

    // --- Tools & delegation ---
    pub tools_enabled: bool,
    pub tool_servers: Vec<ToolServerConfig>,
    pub delegation_enabled: bool,
    pub peer_agents: Vec<PeerAgentConfig>,

    // --- Deadlines ---
    pub request_timeout_secs: u64,
    pub tool_timeout_secs: u64,
    pub delegation_timeout_secs: u64,
    pub model_timeout_secs: u64,
}

// Keep the API key out of logs.
impl std::fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("agent_name", &self.agent_name)
            .field("port", &self.port)
            .field("model_api_url", &self.model_api_url)
            .field(
                "model_api_key",
                &self.model_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("model_name", &self.model_name)
            .field("memory_enabled", &self.memory_enabled)
            .field("memory_type", &self.memory_type)
            .field("context_window_size", &self.context_window_size)
            .field("max_sessions", &self.max_sessions)
            .field("max_events_per_session", &self.max_events_per_session)
            .field("max_reasoning_steps", &self.max_reasoning_steps)
            .field("tools_enabled", &self.tools_enabled)
            .field("tool_servers", &self.tool_servers)
            .field("delegation_enabled", &self.delegation_enabled)
            .field("peer_agents", &self.peer_agents)
            .finish_non_exhaustive()
    }
}

impl RuntimeConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable lookup. `from_env` delegates here;
    /// tests inject maps instead of mutating process state.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let config = Self {
            agent_name: get("AGENT_NAME").unwrap_or_else(|| "agent".into()),
            agent_description: get("AGENT_DESCRIPTION")
                .unwrap_or_else(|| "Agentry runtime agent".into()),
            agent_instructions: get("AGENT_INSTRUCTIONS")
                .unwrap_or_else(|| "You are a helpful assistant.".into()),
            port: parse_var(&get, "AGENT_PORT", 8080)?,

            model_api_url: trim_url(require("MODEL_API_URL")?),
            model_api_key: get("MODEL_API_KEY"),
            model_name: require("MODEL_NAME")?,
            model_temperature: parse_var(&get, "MODEL_TEMPERATURE", 0.7)?,
            model_max_tokens: match get("MODEL_MAX_TOKENS") {
                Some(raw) => Some(parse_value("MODEL_MAX_TOKENS", &raw)?),
                None => None,
            },

            memory_enabled: parse_var(&get, "MEMORY_ENABLED", true)?,
            memory_type: match get("MEMORY_TYPE").as_deref() {
                None | Some("local") => MemoryType::Local,
                Some("none") => MemoryType::None,
                Some(other) => {
                    return Err(ConfigError::Invalid {
                        var: "MEMORY_TYPE",
                        reason: format!("expected 'local' or 'none', got '{other}'"),
                    });
                }
            },
            context_window_size: parse_var(&get, "CONTEXT_WINDOW_SIZE", 20)?,
            max_sessions: parse_var(&get, "MAX_SESSIONS", 1000)?,
            max_events_per_session: parse_var(&get, "MAX_EVENTS_PER_SESSION", 200)?,

            max_reasoning_steps: parse_var(&get, "MAX_REASONING_STEPS", 8)?,

            tools_enabled: parse_var(&get, "TOOLS_ENABLED", true)?,
            tool_servers: named_endpoints(&get, "MCP_SERVERS", "MCP_SERVER")?
                .into_iter()
                .map(|(name, url, _)| ToolServerConfig { name, url })
                .collect(),
            delegation_enabled: parse_var(&get, "DELEGATION_ENABLED", true)?,
            peer_agents: named_endpoints(&get, "PEER_AGENTS", "PEER_AGENT")?
                .into_iter()
                .map(|(name, url, description)| PeerAgentConfig { name, url, description })
                .collect(),

            request_timeout_secs: parse_var(&get, "REQUEST_TIMEOUT_SECS", 120)?,
            tool_timeout_secs: parse_var(&get, "TOOL_TIMEOUT_SECS", 30)?,
            delegation_timeout_secs: parse_var(&get, "DELEGATION_TIMEOUT_SECS", 60)?,
            model_timeout_secs: parse_var(&get, "MODEL_TIMEOUT_SECS", 90)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.model_temperature) {
            return Err(ConfigError::Invalid {
                var: "MODEL_TEMPERATURE",
                reason: "must be between 0.0 and 2.0".into(),
            });
        }
        if self.max_sessions == 0 {
            return Err(ConfigError::Invalid {
                var: "MAX_SESSIONS",
                reason: "must be at least 1".into(),
            });
        }
        if self.max_events_per_session == 0 {
            return Err(ConfigError::Invalid {
                var: "MAX_EVENTS_PER_SESSION",
                reason: "must be at least 1".into(),
            });
        }
        if self.max_reasoning_steps == 0 {
            return Err(ConfigError::Invalid {
                var: "MAX_REASONING_STEPS",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

/// Resolve a comma-separated name list plus per-name `<PREFIX>_<NAME>_URL`
/// (and optional `_DESCRIPTION`) variables into (name, url, description)
/// triples. Dashes in names map to underscores in variable names.
fn named_endpoints(
    get: &impl Fn(&str) -> Option<String>,
    list_var: &'static str,
    prefix: &str,
) -> Result<Vec<(String, String, String)>, ConfigError> {
    let Some(raw) = get(list_var) else {
        return Ok(Vec::new());
    };

    let mut out = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let key_part = name.to_uppercase().replace('-', "_");
        let url_key = format!("{prefix}_{key_part}_URL");
        let url = get(&url_key).ok_or(ConfigError::Invalid {
            var: list_var,
            reason: format!("'{name}' is listed but {url_key} is not set"),
        })?;
        let description = get(&format!("{prefix}_{key_part}_DESCRIPTION")).unwrap_or_default();
        out.push((name.to_string(), trim_url(url), description));
    }
    Ok(out)
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

fn parse_var<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(var) {
        Some(raw) => parse_value(var, &raw),
        None => Ok(default),
    }
}

fn parse_value<T: std::str::FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        var,
        reason: format!("could not parse '{raw}'"),
    })
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("MODEL_API_URL", "http://localhost:11434"),
            ("MODEL_NAME", "smollm2:135m"),
        ]
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = RuntimeConfig::from_lookup(lookup(&minimal())).unwrap();
        assert_eq!(config.agent_name, "agent");
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_reasoning_steps, 8);
        assert_eq!(config.max_sessions, 1000);
        assert_eq!(config.max_events_per_session, 200);
        assert_eq!(config.context_window_size, 20);
        assert!(config.memory_enabled);
        assert_eq!(config.memory_type, MemoryType::Local);
        assert!(config.tool_servers.is_empty());
        assert!(config.peer_agents.is_empty());
    }

    #[test]
    fn missing_model_url_is_rejected() {
        let err = RuntimeConfig::from_lookup(lookup(&[("MODEL_NAME", "m")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("MODEL_API_URL")));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let mut vars = minimal();
        vars[0] = ("MODEL_API_URL", "http://localhost:11434/");
        let config = RuntimeConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.model_api_url, "http://localhost:11434");
    }

    #[test]
    fn named_tool_servers_resolve_urls() {
        let mut vars = minimal();
        vars.push(("MCP_SERVERS", "calc, web-tools"));
        vars.push(("MCP_SERVER_CALC_URL", "http://calc:8001"));
        vars.push(("MCP_SERVER_WEB_TOOLS_URL", "http://web:8002/"));
        let config = RuntimeConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.tool_servers.len(), 2);
        assert_eq!(config.tool_servers[0].name, "calc");
        assert_eq!(config.tool_servers[1].name, "web-tools");
        assert_eq!(config.tool_servers[1].url, "http://web:8002");
    }

    #[test]
    fn listed_server_without_url_is_rejected() {
        let mut vars = minimal();
        vars.push(("MCP_SERVERS", "calc"));
        let err = RuntimeConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(err.to_string().contains("MCP_SERVER_CALC_URL"));
    }

    #[test]
    fn peer_agents_carry_descriptions() {
        let mut vars = minimal();
        vars.push(("PEER_AGENTS", "worker-1"));
        vars.push(("PEER_AGENT_WORKER_1_URL", "http://worker-1:8080"));
        vars.push(("PEER_AGENT_WORKER_1_DESCRIPTION", "Handles math"));
        let config = RuntimeConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.peer_agents.len(), 1);
        assert_eq!(config.peer_agents[0].name, "worker-1");
        assert_eq!(config.peer_agents[0].description, "Handles math");
    }

    #[test]
    fn zero_capacities_are_rejected() {
        let mut vars = minimal();
        vars.push(("MAX_EVENTS_PER_SESSION", "0"));
        let err = RuntimeConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(err.to_string().contains("MAX_EVENTS_PER_SESSION"));
    }

    #[test]
    fn bad_memory_type_is_rejected() {
        let mut vars = minimal();
        vars.push(("MEMORY_TYPE", "redis"));
        let err = RuntimeConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(err.to_string().contains("MEMORY_TYPE"));
    }

    #[test]
    fn memory_type_none_parses() {
        let mut vars = minimal();
        vars.push(("MEMORY_TYPE", "none"));
        vars.push(("MEMORY_ENABLED", "false"));
        let config = RuntimeConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.memory_type, MemoryType::None);
        assert!(!config.memory_enabled);
    }

    #[test]
    fn temperature_out_of_range_is_rejected() {
        let mut vars = minimal();
        vars.push(("MODEL_TEMPERATURE", "3.5"));
        let err = RuntimeConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(err.to_string().contains("MODEL_TEMPERATURE"));
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let mut vars = minimal();
        vars.push(("MODEL_API_KEY", "sk-secret-123"));
        let config = RuntimeConfig::from_lookup(lookup(&vars)).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret-123"));
        assert!(debug.contains("REDACTED"));
    }
}
