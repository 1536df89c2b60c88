use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::realtime::types::{SessionHandle, SessionId};

/// Client registry: `session_id -> SessionHandle`.
///
/// Keyed by identity, not by name (names may repeat). One mutex serializes
/// mutations and snapshot creation; the lock is never held across I/O.
#[derive(Default)]
pub struct ClientRegistry {
    sessions: Mutex<BTreeMap<SessionId, SessionHandle>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Every critical section is a single map operation, so a poisoned map is
    // still consistent.
    fn lock(&self) -> MutexGuard<'_, BTreeMap<SessionId, SessionHandle>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns false if this session id is already present.
    pub fn register(&self, session: SessionHandle) -> bool {
        let mut map = self.lock();
        if map.contains_key(&session.id()) {
            return false;
        }
        map.insert(session.id(), session);
        true
    }

    /// Idempotent: removing an absent session returns `None`.
    pub fn unregister(&self, id: SessionId) -> Option<SessionHandle> {
        self.lock().remove(&id)
    }

    /// Point-in-time copy in join order.
    pub fn snapshot(&self) -> Vec<SessionHandle> {
        self.lock().values().cloned().collect()
    }

    /// Names of sessions that are still open. A session that closed itself
    /// stays in the map until the relay handles its `Leave`; it is not listed.
    pub fn names(&self) -> Vec<String> {
        self.lock()
            .values()
            .filter(|s| !s.is_closed())
            .map(|s| s.name().to_owned())
            .collect()
    }

    /// True while `id` is in the map, closed or not.
    pub fn contains(&self, id: SessionId) -> bool {
        self.lock().contains_key(&id)
    }

    /// Number of open sessions, matching `names`.
    pub fn len(&self) -> usize {
        self.lock().values().filter(|s| !s.is_closed()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
