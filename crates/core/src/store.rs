//! The session-store trait: the memory contract every backend satisfies.
//!
//! Two implementations exist: a stateful, capacity-bounded in-process store
//! and a no-op store that discards all writes and returns empty reads (used
//! when memory is disabled or for stateless deployments). Which one a
//! deployment gets is decided at construction time from configuration.
//!
//! Every operation is a total function over its domain. An unknown
//! `session_id` yields an empty result or `false`, never an error; that is
//! why these methods return plain values instead of `Result`.

use async_trait::async_trait;

use crate::event::{EventType, MemoryEvent};
use crate::session::{MemoryStats, SessionSummary};

/// The core session-store trait.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The backend name (e.g., "local", "none").
    fn name(&self) -> &str;

    /// Create a session and return its id. Supplying an id that already
    /// exists reuses the existing session rather than creating a duplicate.
    async fn create_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: Option<String>,
    ) -> String {
        self.get_or_create_session(session_id, app_name, user_id).await
    }

    /// Return the existing session when `session_id` is given and found;
    /// otherwise create one (evicting the oldest sessions when at capacity).
    async fn get_or_create_session(
        &self,
        session_id: Option<String>,
        app_name: &str,
        user_id: &str,
    ) -> String;

    /// List session summaries in creation order, optionally filtered by user.
    async fn list_sessions(&self, user_id: Option<&str>) -> Vec<SessionSummary>;

    /// Delete a session. Returns `true` when a session was removed.
    async fn delete_session(&self, session_id: &str) -> bool;

    /// Append one event. Returns `false` for an unknown session.
    ///
    /// When the session is at its event capacity the oldest events are
    /// evicted first; the bound holds after every call.
    async fn add_event(&self, session_id: &str, event: MemoryEvent) -> bool;

    /// All events of a session, oldest first, optionally filtered to a set
    /// of types. Empty for an unknown session.
    async fn get_session_events(
        &self,
        session_id: &str,
        event_types: Option<&[EventType]>,
    ) -> Vec<MemoryEvent>;

    /// Render the last `max_events` user/assistant events into a
    /// role-prefixed transcript, oldest first.
    async fn build_conversation_context(&self, session_id: &str, max_events: usize) -> String;

    /// Delete sessions whose last activity is older than `max_age`.
    /// Returns the number of sessions removed.
    async fn cleanup_old_sessions(&self, max_age: chrono::Duration) -> usize;

    /// Aggregate statistics over the store.
    async fn stats(&self) -> MemoryStats;
}
