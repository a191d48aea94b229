//! Session-store implementations for Agentry.

pub mod local;
pub mod noop;

pub use local::LocalSessionStore;
pub use noop::NoopSessionStore;

use std::sync::Arc;

use agentry_config::{MemoryType, RuntimeConfig};
use agentry_core::SessionStore;

/// Build the session store selected by configuration.
///
/// Memory disabled, or `MEMORY_TYPE=none`, yields the no-op store; both
/// variants satisfy the same trait, so the rest of the runtime never checks
/// which one it got.
pub fn store_from_config(config: &RuntimeConfig) -> Arc<dyn SessionStore> {
    if !config.memory_enabled || config.memory_type == MemoryType::None {
        tracing::info!(backend = "none", "Session memory disabled");
        return Arc::new(NoopSessionStore);
    }

    tracing::info!(
        backend = "local",
        max_sessions = config.max_sessions,
        max_events_per_session = config.max_events_per_session,
        "Session memory enabled"
    );
    Arc::new(LocalSessionStore::new(
        config.max_sessions,
        config.max_events_per_session,
    ))
}
