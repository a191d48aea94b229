//! The bounded in-process session store.
//!
//! Sessions live in a `HashMap`; each session's event ledger is a `VecDeque`
//! so FIFO eviction is O(1) per append. A single `tokio::sync::RwLock`
//! guards the whole store: `add_event` and both eviction paths run inside
//! one write-lock critical section, which is what keeps the capacity
//! invariants true under concurrent invocations, including two invocations
//! racing on the same session id.
//!
//! Nothing here is durable. Store state lives for the lifetime of the
//! serving process and is not shared across replicas.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use agentry_core::event::{EventType, MemoryEvent};
use agentry_core::session::{MemoryStats, Session, SessionSummary};
use agentry_core::store::SessionStore;

struct SessionRecord {
    session: Session,
    events: VecDeque<MemoryEvent>,
    updated_at: DateTime<Utc>,
}

impl SessionRecord {
    fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.session.session_id.clone(),
            app_name: self.session.app_name.clone(),
            user_id: self.session.user_id.clone(),
            created_at: self.session.created_at,
            updated_at: self.updated_at,
            event_count: self.events.len(),
        }
    }
}

struct Inner {
    sessions: HashMap<String, SessionRecord>,
    /// Session ids, oldest creation first. Drives batch eviction and keeps
    /// listings in creation order.
    creation_order: VecDeque<String>,
}

/// The stateful session store.
pub struct LocalSessionStore {
    max_sessions: usize,
    max_events_per_session: usize,
    inner: RwLock<Inner>,
}

impl LocalSessionStore {
    pub fn new(max_sessions: usize, max_events_per_session: usize) -> Self {
        Self {
            max_sessions: max_sessions.max(1),
            max_events_per_session: max_events_per_session.max(1),
            inner: RwLock::new(Inner {
                sessions: HashMap::new(),
                creation_order: VecDeque::new(),
            }),
        }
    }

    /// Number of sessions evicted per batch: ⌈max_sessions / 10⌉.
    fn eviction_batch(&self) -> usize {
        self.max_sessions.div_ceil(10)
    }

    /// Evict the oldest sessions until there is room for one more.
    /// Caller holds the write lock.
    fn evict_oldest(&self, inner: &mut Inner) {
        let batch = self.eviction_batch();
        for _ in 0..batch {
            let Some(oldest) = inner.creation_order.pop_front() else {
                break;
            };
            if let Some(record) = inner.sessions.remove(&oldest) {
                debug!(
                    session_id = %oldest,
                    dropped_events = record.events.len(),
                    "Evicted oldest session at capacity"
                );
            }
        }
    }
}

#[async_trait]
impl SessionStore for LocalSessionStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn get_or_create_session(
        &self,
        session_id: Option<String>,
        app_name: &str,
        user_id: &str,
    ) -> String {
        let mut inner = self.inner.write().await;

        if let Some(id) = &session_id {
            if inner.sessions.contains_key(id) {
                return id.clone();
            }
        }

        if inner.sessions.len() >= self.max_sessions {
            self.evict_oldest(&mut inner);
        }

        let session = Session::new(app_name, user_id, session_id);
        let id = session.session_id.clone();
        let now = Utc::now();
        inner.creation_order.push_back(id.clone());
        inner.sessions.insert(
            id.clone(),
            SessionRecord {
                session,
                events: VecDeque::new(),
                updated_at: now,
            },
        );
        debug!(session_id = %id, user_id, "Created session");
        id
    }

    async fn list_sessions(&self, user_id: Option<&str>) -> Vec<SessionSummary> {
        let inner = self.inner.read().await;
        inner
            .creation_order
            .iter()
            .filter_map(|id| inner.sessions.get(id))
            .filter(|r| user_id.is_none_or(|u| r.session.user_id == u))
            .map(SessionRecord::summary)
            .collect()
    }

    async fn delete_session(&self, session_id: &str) -> bool {
        let mut inner = self.inner.write().await;
        let removed = inner.sessions.remove(session_id).is_some();
        if removed {
            inner.creation_order.retain(|id| id != session_id);
            debug!(session_id, "Deleted session");
        }
        removed
    }

    async fn add_event(&self, session_id: &str, event: MemoryEvent) -> bool {
        let mut inner = self.inner.write().await;
        let Some(record) = inner.sessions.get_mut(session_id) else {
            debug!(session_id, "Dropping event for unknown session");
            return false;
        };

        // FIFO eviction keeps the bound before the append lands.
        while record.events.len() >= self.max_events_per_session {
            record.events.pop_front();
        }
        record.events.push_back(event);
        record.updated_at = Utc::now();
        true
    }

    async fn get_session_events(
        &self,
        session_id: &str,
        event_types: Option<&[EventType]>,
    ) -> Vec<MemoryEvent> {
        let inner = self.inner.read().await;
        let Some(record) = inner.sessions.get(session_id) else {
            return Vec::new();
        };
        record
            .events
            .iter()
            .filter(|e| event_types.is_none_or(|types| types.contains(&e.event_type)))
            .cloned()
            .collect()
    }

    async fn build_conversation_context(&self, session_id: &str, max_events: usize) -> String {
        let inner = self.inner.read().await;
        let Some(record) = inner.sessions.get(session_id) else {
            return String::new();
        };

        let mut recent: Vec<&MemoryEvent> = record
            .events
            .iter()
            .rev()
            .filter(|e| {
                matches!(e.event_type, EventType::UserMessage | EventType::AgentResponse)
            })
            .take(max_events)
            .collect();
        recent.reverse();

        recent
            .iter()
            .map(|e| {
                let prefix = match e.event_type {
                    EventType::UserMessage => "User",
                    _ => "Assistant",
                };
                format!("{prefix}: {}", e.content_text())
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    async fn cleanup_old_sessions(&self, max_age: Duration) -> usize {
        let cutoff = Utc::now() - max_age;
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;

        let stale: Vec<String> = inner
            .sessions
            .iter()
            .filter(|(_, r)| r.updated_at < cutoff)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &stale {
            inner.sessions.remove(id);
        }
        let sessions = &inner.sessions;
        inner.creation_order.retain(|id| sessions.contains_key(id));

        if !stale.is_empty() {
            debug!(count = stale.len(), "Cleaned up stale sessions");
        }
        stale.len()
    }

    async fn stats(&self) -> MemoryStats {
        let inner = self.inner.read().await;
        let total_sessions = inner.sessions.len();
        let total_events: usize = inner.sessions.values().map(|r| r.events.len()).sum();
        MemoryStats {
            total_sessions,
            total_events,
            avg_events_per_session: if total_sessions == 0 {
                0.0
            } else {
                total_events as f64 / total_sessions as f64
            },
        }
    }
}
