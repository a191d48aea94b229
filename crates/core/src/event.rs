//! Memory events: the immutable records that make up a session's ledger.
//!
//! Every interesting thing that happens during a task invocation (the user's
//! message, model answers, tool calls and their results, delegations, errors)
//! is appended to the owning session as one `MemoryEvent`. Events are never
//! mutated or reordered after insertion; they are destroyed only when their
//! session is evicted or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of a memory event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// An inbound task / user message
    UserMessage,
    /// A final (or best-effort partial) answer from the agent
    AgentResponse,
    /// The agent decided to invoke a tool
    ToolCall,
    /// A tool returned successfully
    ToolResult,
    /// The agent forwarded a sub-task to a peer
    DelegationRequest,
    /// A peer answered a delegated sub-task
    DelegationResponse,
    /// A recovered failure (tool, delegation, or model)
    Error,
}

impl EventType {
    /// The wire name, as it appears in serialized events and query filters.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::UserMessage => "user_message",
            EventType::AgentResponse => "agent_response",
            EventType::ToolCall => "tool_call",
            EventType::ToolResult => "tool_result",
            EventType::DelegationRequest => "delegation_request",
            EventType::DelegationResponse => "delegation_response",
            EventType::Error => "error",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable record in a session's event ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEvent {
    /// Unique event ID
    pub event_id: String,

    /// When the event was recorded
    pub timestamp: DateTime<Utc>,

    /// What kind of event this is
    pub event_type: EventType,

    /// Opaque payload; its shape depends on `event_type`
    pub content: serde_json::Value,

    /// Key-value annotations (error kinds, tool names, terminal reasons)
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl MemoryEvent {
    /// Create a new event with a generated id and the current timestamp.
    pub fn new(event_type: EventType, content: impl Into<serde_json::Value>) -> Self {
        Self {
            event_id: format!("event_{}", &Uuid::new_v4().simple().to_string()[..8]),
            timestamp: Utc::now(),
            event_type,
            content: content.into(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Attach a metadata entry.
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Render the content as plain text: strings verbatim, everything else
    /// as compact JSON.
    pub fn content_text(&self) -> String {
        match &self.content {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}
