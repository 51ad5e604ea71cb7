//! Session storage: per-conversation state held between turns.
//!
//! The planner itself is stateless across calls; whoever drives it keeps a
//! [`SessionState`] per conversation id in a [`SessionStore`].

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::planner::{Conversation, SlotStore, TurnOutcome};

/// Everything needed to resume a conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub slots: SlotStore,
    pub history: Conversation,
    pub turn_count: usize,
}

impl SessionState {
    /// Replace this state with the result of a processed turn.
    pub fn apply(&mut self, outcome: &TurnOutcome) {
        self.slots = outcome.slots.clone();
        self.history = outcome.history.clone();
        self.turn_count = outcome.turn_count;
    }
}

/// Fresh opaque session id.
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

pub trait SessionStore: Send + Sync {
    /// `None` for unknown or expired ids.
    fn load(&self, id: &str) -> Option<SessionState>;

    fn save(&self, id: &str, state: SessionState);

    fn remove(&self, id: &str);

    /// Drop expired sessions. Returns how many were removed.
    fn purge_expired(&self) -> usize;

    /// The stored state, or an empty one.
    fn load_or_default(&self, id: &str) -> SessionState {
        self.load(id).unwrap_or_default()
    }
}

struct Entry {
    state: SessionState,
    touched_at: DateTime<Utc>,
}

/// Process-local store with a sliding TTL: saving refreshes the timestamp.
pub struct InMemorySessionStore {
    entries: Mutex<HashMap<String, Entry>>,
    ttl: Duration,
}

impl InMemorySessionStore {
    pub fn new(ttl_secs: u64) -> Self {
        let ttl_secs = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: Duration::try_seconds(ttl_secs).unwrap_or(Duration::MAX),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_expired(&self, entry: &Entry, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(entry.touched_at) >= self.ttl
    }
}

impl SessionStore for InMemorySessionStore {
    fn load(&self, id: &str) -> Option<SessionState> {
        let mut entries = self.lock();
        let now = Utc::now();
        let entry = entries.get(id)?;
        if !self.is_expired(entry, now) {
            return Some(entry.state.clone());
        }
        entries.remove(id);
        tracing::debug!(session = id, "session expired");
        None
    }

    fn save(&self, id: &str, state: SessionState) {
        self.lock().insert(
            id.to_string(),
            Entry {
                state,
                touched_at: Utc::now(),
            },
        );
    }

    fn remove(&self, id: &str) {
        self.lock().remove(id);
    }

    fn purge_expired(&self) -> usize {
        let mut entries = self.lock();
        let now = Utc::now();
        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry, now));
        before - entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_for(destination: &str) -> SessionState {
        SessionState {
            slots: SlotStore {
                destination: Some(destination.into()),
                ..SlotStore::default()
            },
            turn_count: 1,
            ..SessionState::default()
        }
    }

    #[test]
    fn save_and_load() {
        let store = InMemorySessionStore::new(3600);
        let id = new_session_id();
        store.save(&id, state_for("Paris"));
        let loaded = store.load(&id).unwrap();
        assert_eq!(loaded.slots.destination.as_deref(), Some("Paris"));
        assert_eq!(loaded.turn_count, 1);
    }

    #[test]
    fn unknown_id_yields_fresh_state() {
        let store = InMemorySessionStore::new(3600);
        assert!(store.load("nope").is_none());
        assert_eq!(store.load_or_default("nope"), SessionState::default());
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        let store = InMemorySessionStore::new(0);
        store.save("a", state_for("Rome"));
        assert!(store.load("a").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn purge_removes_only_expired() {
        let expiring = InMemorySessionStore::new(0);
        expiring.save("a", state_for("Rome"));
        expiring.save("b", state_for("Oslo"));
        assert_eq!(expiring.purge_expired(), 2);

        let lasting = InMemorySessionStore::new(3600);
        lasting.save("a", state_for("Rome"));
        assert_eq!(lasting.purge_expired(), 0);
        assert_eq!(lasting.len(), 1);
    }

    #[test]
    fn remove_forgets_session() {
        let store = InMemorySessionStore::new(3600);
        store.save("a", state_for("Rome"));
        store.remove("a");
        assert!(store.load("a").is_none());
    }

    #[test]
    fn session_ids_are_unique_uuids() {
        let a = new_session_id();
        let b = new_session_id();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
    }
}
