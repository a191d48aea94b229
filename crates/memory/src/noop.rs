//! No-op session store: discards all writes, returns empty reads.
//!
//! Used when memory is disabled or for stateless deployments. It still hands
//! out session ids so callers keep a stable reference for the duration of an
//! invocation, but nothing is retained and nothing ever fails.

use async_trait::async_trait;
use chrono::Duration;

use agentry_core::event::{EventType, MemoryEvent};
use agentry_core::session::{generate_session_id, MemoryStats, SessionSummary};
use agentry_core::store::SessionStore;

/// The stateless session store.
pub struct NoopSessionStore;

#[async_trait]
impl SessionStore for NoopSessionStore {
    fn name(&self) -> &str {
        "none"
    }

    async fn get_or_create_session(
        &self,
        session_id: Option<String>,
        _app_name: &str,
        _user_id: &str,
    ) -> String {
        session_id.unwrap_or_else(generate_session_id)
    }

    async fn list_sessions(&self, _user_id: Option<&str>) -> Vec<SessionSummary> {
        Vec::new()
    }

    async fn delete_session(&self, _session_id: &str) -> bool {
        false
    }

    async fn add_event(&self, _session_id: &str, _event: MemoryEvent) -> bool {
        true
    }

    async fn get_session_events(
        &self,
        _session_id: &str,
        _event_types: Option<&[EventType]>,
    ) -> Vec<MemoryEvent> {
        Vec::new()
    }

    async fn build_conversation_context(&self, _session_id: &str, _max_events: usize) -> String {
        String::new()
    }

    async fn cleanup_old_sessions(&self, _max_age: Duration) -> usize {
        0
    }

    async fn stats(&self) -> MemoryStats {
        MemoryStats::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_are_accepted_and_discarded() {
        let store = NoopSessionStore;
        let id = store.create_session("app", "alice", None).await;
        assert!(id.starts_with("session_"));

        assert!(store.add_event(&id, MemoryEvent::new(EventType::UserMessage, "hi")).await);
        assert!(store.get_session_events(&id, None).await.is_empty());
        assert_eq!(store.build_conversation_context(&id, 10).await, "");
        assert_eq!(store.stats().await.total_sessions, 0);
    }

    #[tokio::test]
    async fn supplied_ids_are_echoed_back() {
        let store = NoopSessionStore;
        let id = store
            .get_or_create_session(Some("session_fixed".into()), "app", "alice")
            .await;
        assert_eq!(id, "session_fixed");
    }

    #[tokio::test]
    async fn deletes_and_cleanup_are_noops() {
        let store = NoopSessionStore;
        assert!(!store.delete_session("session_x").await);
        assert_eq!(store.cleanup_old_sessions(Duration::zero()).await, 0);
        assert!(store.list_sessions(None).await.is_empty());
    }
}
