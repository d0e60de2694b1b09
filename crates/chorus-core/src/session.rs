//! Per-session conversation storage.
//!
//! Each session owns one [`Conversation`] behind its own async mutex, so
//! turns within a session run one at a time while different sessions
//! proceed independently. State lives in process memory only.
//!
//! The store is bounded two ways:
//!
//! | Limit | Applied |
//! |-------|---------|
//! | idle TTL | on every insert, and by [`SessionStore::evict_idle`] |
//! | max sessions | on insert, dropping the least recently used session |

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::conversation::Conversation;

/// Shared handle to one session's conversation.
pub type SessionHandle = Arc<Mutex<Conversation>>;

/// Default cap on live sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

/// Default idle time after which a session is dropped.
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(60 * 60);

/// A fresh random session identifier.
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

struct Entry {
    handle: SessionHandle,
    last_used: Instant,
}

/// In-memory map from session id to conversation.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Entry>>,
    max_sessions: usize,
    idle_ttl: Option<Duration>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_limits(DEFAULT_MAX_SESSIONS, Some(DEFAULT_IDLE_TTL))
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding at most `max_sessions` sessions (at least one),
    /// dropping any left unused for `idle_ttl`. `None` never expires them.
    pub fn with_limits(max_sessions: usize, idle_ttl: Option<Duration>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions: max_sessions.max(1),
            idle_ttl,
        }
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    pub fn idle_ttl(&self) -> Option<Duration> {
        self.idle_ttl
    }

    /// The session's conversation, created empty on first use.
    ///
    /// Creating a session first drops idle ones, then the least recently
    /// used while the store is full.
    pub async fn get_or_create(&self, id: &str) -> SessionHandle {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        if let Some(entry) = sessions.get_mut(id) {
            entry.last_used = now;
            return Arc::clone(&entry.handle);
        }

        self.make_room(&mut sessions, now);
        let handle: SessionHandle = Arc::new(Mutex::new(Conversation::new()));
        sessions.insert(
            id.to_string(),
            Entry {
                handle: Arc::clone(&handle),
                last_used: now,
            },
        );
        debug!(session = id, live = sessions.len(), "Session created");
        handle
    }

    /// The session's conversation, if it exists. Counts as a use.
    pub async fn get(&self, id: &str) -> Option<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        sessions.get_mut(id).map(|entry| {
            entry.last_used = Instant::now();
            Arc::clone(&entry.handle)
        })
    }

    /// Empties the session's conversation. Unknown ids are a no-op.
    pub async fn clear(&self, id: &str) {
        if let Some(handle) = self.get(id).await {
            handle.lock().await.clear();
            debug!(session = id, "Session cleared");
        }
    }

    /// Drops the session entirely. Returns whether it existed.
    pub async fn remove(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Drops sessions idle for longer than the TTL. Returns how many.
    pub async fn evict_idle(&self) -> usize {
        self.evict_idle_at(Instant::now()).await
    }

    /// [`evict_idle`](Self::evict_idle) as seen at `now`.
    pub async fn evict_idle_at(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.write().await;
        self.remove_idle(&mut sessions, now)
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    fn make_room(&self, sessions: &mut HashMap<String, Entry>, now: Instant) {
        self.remove_idle(sessions, now);

        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    sessions.remove(&id);
                    debug!(session = %id, "Evicted least recently used session");
                }
                None => break,
            }
        }
    }

    fn remove_idle(&self, sessions: &mut HashMap<String, Entry>, now: Instant) -> usize {
        let Some(ttl) = self.idle_ttl else {
            return 0;
        };

        let before = sessions.len();
        sessions.retain(|_, entry| now.saturating_duration_since(entry.last_used) < ttl);
        let removed = before - sessions.len();
        if removed > 0 {
            debug!(removed, live = sessions.len(), "Idle sessions evicted");
        }
        removed
    }
}
