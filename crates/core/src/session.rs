//! Session domain types.
//!
//! A session is a bounded conversation context identified by an id, holding
//! an ordered event log. Sessions are owned exclusively by the session store;
//! everything else refers to them by `session_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of one conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique session ID
    pub session_id: String,

    /// The application this session belongs to
    pub app_name: String,

    /// The user this session belongs to
    pub user_id: String,

    /// When the session was created
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session, generating an id when none is supplied.
    pub fn new(
        app_name: impl Into<String>,
        user_id: impl Into<String>,
        session_id: Option<String>,
    ) -> Self {
        Self {
            session_id: session_id.unwrap_or_else(generate_session_id),
            app_name: app_name.into(),
            user_id: user_id.into(),
            created_at: Utc::now(),
        }
    }
}

/// Generate a session id of the form `session_<12 hex chars>`.
pub fn generate_session_id() -> String {
    format!("session_{}", &Uuid::new_v4().simple().to_string()[..12])
}

/// Read-model projection of a session for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub app_name: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,

    /// Last-activity timestamp (updated on every appended event)
    pub updated_at: DateTime<Utc>,

    /// Number of events currently retained
    pub event_count: usize,
}

/// Aggregate statistics over the whole store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStats {
    pub total_sessions: usize,
    pub total_events: usize,
    pub avg_events_per_session: f64,
}
