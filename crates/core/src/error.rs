//! Error types for the Agentry domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Each remote boundary
//! (tool servers, peer agents, the completion model) has its own error enum,
//! and every leaf variant exposes a stable `kind()` string that the reasoning
//! loop records in error-event metadata.
//!
//! Note what is missing: the session store has no error type. Its operations
//! are total; an unknown session id yields an empty result or `false`.

use thiserror::Error;

/// The top-level error type for all Agentry operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Model errors ---
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Delegation errors ---
    #[error("Delegation error: {0}")]
    Delegation(#[from] DelegationError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Remote boundary errors ---

/// Failures talking to a remote tool server.
///
/// All of these are recovered by the reasoning loop: the failure becomes an
/// `error` event and the model sees it on the next step.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },

    #[error("Tool server error: {tool_name}: {reason}")]
    Remote { tool_name: String, reason: String },
}

impl ToolError {
    /// Stable machine-readable kind, recorded in error-event metadata.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::NotFound(_) => "tool_not_found",
            ToolError::Timeout { .. } => "tool_timeout",
            ToolError::Remote { .. } => "tool_remote_error",
        }
    }
}

/// Failures delegating a task to a peer agent.
#[derive(Debug, Clone, Error)]
pub enum DelegationError {
    #[error("Unknown peer agent: {0}")]
    UnknownPeer(String),

    #[error("Peer unreachable: {peer}: {reason}")]
    Unreachable { peer: String, reason: String },

    #[error("Peer timed out: {peer} after {timeout_secs}s")]
    Timeout { peer: String, timeout_secs: u64 },
}

impl DelegationError {
    /// Stable machine-readable kind, recorded in error-event metadata.
    pub fn kind(&self) -> &'static str {
        match self {
            DelegationError::UnknownPeer(_) => "peer_not_found",
            DelegationError::Unreachable { .. } => "peer_unreachable",
            DelegationError::Timeout { .. } => "peer_timeout",
        }
    }
}

/// Failures calling the completion model.
///
/// Unlike tool and delegation errors these are fatal for the current
/// invocation, unless a partial answer already exists.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("Model unavailable: {0}")]
    Unavailable(String),

    #[error("Model API error: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Model request timed out after {0}s")]
    Timeout(u64),

    #[error("Invalid model response: {0}")]
    InvalidResponse(String),
}

impl ModelError {
    /// Stable machine-readable kind, recorded in error-event metadata.
    pub fn kind(&self) -> &'static str {
        match self {
            ModelError::Unavailable(_) => "model_unavailable",
            ModelError::Api { .. } => "model_api_error",
            ModelError::Timeout(_) => "model_timeout",
            ModelError::InvalidResponse(_) => "model_invalid_response",
        }
    }
}
