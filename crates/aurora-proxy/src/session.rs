//! Per-connection session attributes.
//!
//! Plugin-private flags that have no server-side session variable (such as
//! strict-writer) live here, keyed by [`ConnectionId`]. Entries are removed
//! when their connection closes or is dropped; entries whose connection
//! disappeared without either can be swept with
//! [`SessionAttributeStore::purge_orphaned`].

use aurora_core::ConnectionId;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

type Liveness = Weak<dyn Any + Send + Sync>;

#[derive(Default)]
struct SessionEntry {
    attributes: HashMap<String, String>,
    liveness: Option<Liveness>,
}

impl SessionEntry {
    fn is_orphaned(&self) -> bool {
        self.liveness
            .as_ref()
            .is_some_and(|weak| weak.strong_count() == 0)
    }
}

/// Connection-scoped key/value store shared by every connection.
#[derive(Default)]
pub struct SessionAttributeStore {
    sessions: RwLock<HashMap<ConnectionId, SessionEntry>>,
}

impl std::fmt::Debug for SessionAttributeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionAttributeStore")
            .field("sessions", &self.len())
            .finish()
    }
}

impl SessionAttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one attribute. The entry is created on first write.
    pub fn set(&self, id: ConnectionId, key: &str, value: &str) {
        self.write(id, None, key, value);
    }

    /// Set one attribute, tying the entry to the lifetime of `owner`.
    pub fn set_owned<T: Any + Send + Sync>(
        &self,
        id: ConnectionId,
        owner: &Arc<T>,
        key: &str,
        value: &str,
    ) {
        let weak: Weak<T> = Arc::downgrade(owner);
        self.write(id, Some(weak), key, value);
    }

    // Orphaned entries are swept under the same lock.
    fn write(&self, id: ConnectionId, liveness: Option<Liveness>, key: &str, value: &str) {
        let mut sessions = self.sessions.write();
        sweep(&mut sessions);
        let entry = sessions.entry(id).or_default();
        if liveness.is_some() {
            entry.liveness = liveness;
        }
        entry.attributes.insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, id: ConnectionId, key: &str) -> Option<String> {
        self.sessions.read().get(&id)?.attributes.get(key).cloned()
    }

    /// Drop every attribute of a connection. Returns whether it had an entry.
    pub fn clear(&self, id: ConnectionId) -> bool {
        let removed = self.sessions.write().remove(&id).is_some();
        if removed {
            tracing::debug!(connection_id = %id, "Session attributes cleared");
        }
        removed
    }

    /// Remove entries whose owning connection no longer exists.
    pub fn purge_orphaned(&self) -> usize {
        sweep(&mut self.sessions.write())
    }

    /// Number of connections with an entry.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn sweep(sessions: &mut HashMap<ConnectionId, SessionEntry>) -> usize {
    let before = sessions.len();
    sessions.retain(|_, entry| !entry.is_orphaned());
    let purged = before - sessions.len();
    if purged > 0 {
        tracing::info!(purged = purged, "Purged orphaned session entries");
    }
    purged
}
