use chrono::{DateTime, Utc};
use pipegen_core::prompt::PromptTemplates;
use pipegen_core::{CompletionBackend, PromptSession};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// One user's session plus bookkeeping for expiry.
pub struct SessionEntry {
    pub session: PromptSession,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl SessionEntry {
    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }
}

pub type SharedSession = Arc<Mutex<SessionEntry>>;

/// Lock a mutex, recovering the data if a previous holder panicked.
pub fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// SessionRegistry
// ---------------------------------------------------------------------------

/// Sessions keyed by id. Each entry has its own lock so work on one session
/// never blocks or observes another.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<Uuid, SharedSession>>,
    ttl: chrono::Duration,
}

impl SessionRegistry {
    pub fn new(ttl: chrono::Duration) -> Self {
        SessionRegistry {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn insert(&self, session: PromptSession) -> Uuid {
        self.prune(Utc::now());
        let id = Uuid::new_v4();
        let now = Utc::now();
        let entry = SessionEntry {
            session,
            created_at: now,
            last_active: now,
        };
        lock(&self.sessions).insert(id, Arc::new(Mutex::new(entry)));
        id
    }

    /// Look up a live session. An expired one is dropped and reported missing.
    pub fn get(&self, id: &Uuid) -> Option<SharedSession> {
        let mut sessions = lock(&self.sessions);
        let shared = sessions.get(id)?.clone();
        let expired = match shared.try_lock() {
            Ok(entry) => self.is_expired(&entry, Utc::now()),
            // Busy with a request right now, so not idle.
            Err(_) => false,
        };
        if expired {
            sessions.remove(id);
            tracing::debug!(%id, "session expired");
            return None;
        }
        Some(shared)
    }

    pub fn remove(&self, id: &Uuid) -> bool {
        lock(&self.sessions).remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        lock(&self.sessions).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every idle session older than the TTL. Returns how many went.
    pub fn prune(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = lock(&self.sessions);
        let before = sessions.len();
        sessions.retain(|_, shared| match shared.try_lock() {
            Ok(entry) => !self.is_expired(&entry, now),
            Err(_) => true,
        });
        let pruned = before - sessions.len();
        if pruned > 0 {
            tracing::info!(pruned, remaining = sessions.len(), "pruned idle sessions");
        }
        pruned
    }

    fn is_expired(&self, entry: &SessionEntry, now: DateTime<Utc>) -> bool {
        now - entry.last_active > self.ttl
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn CompletionBackend>,
    pub templates: Arc<PromptTemplates>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        templates: PromptTemplates,
        session_ttl: chrono::Duration,
    ) -> Self {
        AppState {
            backend,
            templates: Arc::new(templates),
            sessions: Arc::new(SessionRegistry::new(session_ttl)),
        }
    }

    pub fn new_session(&self) -> PromptSession {
        PromptSession::new(self.backend.clone(), self.templates.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipegen_core::{BackendError, Completion};

    struct Silent;

    impl CompletionBackend for Silent {
        fn complete(&self, _prompt: &str) -> Result<Completion, BackendError> {
            Err(BackendError::Transport("offline".into()))
        }
    }

    fn state(ttl_minutes: i64) -> AppState {
        AppState::new(
            Arc::new(Silent),
            PromptTemplates::default(),
            chrono::Duration::minutes(ttl_minutes),
        )
    }

    #[test]
    fn sessions_are_isolated_by_id() {
        let app = state(60);
        let a = app.sessions.insert(app.new_session());
        let b = app.sessions.insert(app.new_session());
        assert_ne!(a, b);
        assert_eq!(app.sessions.len(), 2);

        let sa = app.sessions.get(&a).unwrap();
        let sb = app.sessions.get(&b).unwrap();
        assert!(!Arc::ptr_eq(&sa, &sb));
    }

    #[test]
    fn remove_forgets_session() {
        let app = state(60);
        let id = app.sessions.insert(app.new_session());
        assert!(app.sessions.remove(&id));
        assert!(!app.sessions.remove(&id));
        assert!(app.sessions.get(&id).is_none());
    }

    #[test]
    fn idle_sessions_are_pruned() {
        let app = state(30);
        let stale = app.sessions.insert(app.new_session());
        let fresh = app.sessions.insert(app.new_session());
        {
            let shared = app.sessions.get(&stale).unwrap();
            lock(&shared).last_active = Utc::now() - chrono::Duration::minutes(45);
        }

        assert_eq!(app.sessions.prune(Utc::now()), 1);
        assert!(app.sessions.get(&stale).is_none());
        assert!(app.sessions.get(&fresh).is_some());
    }

    #[test]
    fn get_drops_expired_session() {
        let app = state(5);
        let id = app.sessions.insert(app.new_session());
        {
            let shared = app.sessions.get(&id).unwrap();
            lock(&shared).last_active = Utc::now() - chrono::Duration::minutes(6);
        }
        assert!(app.sessions.get(&id).is_none());
        assert!(app.sessions.is_empty());
    }

    #[test]
    fn busy_session_is_never_pruned() {
        let app = state(1);
        let id = app.sessions.insert(app.new_session());
        let shared = app.sessions.get(&id).unwrap();
        let mut guard = lock(&shared);
        guard.last_active = Utc::now() - chrono::Duration::minutes(10);

        assert_eq!(app.sessions.prune(Utc::now()), 0);
        drop(guard);
        assert_eq!(app.sessions.prune(Utc::now()), 1);
    }
}
