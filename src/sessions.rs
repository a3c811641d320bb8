//! Live sessions owned by the HTTP layer
//!
//! Each session sits behind its own mutex. Actions take it with `try_lock`,
//! so a second action arriving while one is still running is rejected
//! instead of queued.

use crate::error::OcrError;
use crate::session::Session;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::time::{Duration, Instant};
use uuid::Uuid;

pub type SharedSession = Arc<Mutex<Session>>;

struct Entry {
    session: SharedSession,
    last_used: Instant,
}

pub struct SessionStore {
    entries: Mutex<HashMap<Uuid, Entry>>,
    ttl: Duration,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            max_sessions,
        }
    }

    fn entries(&self) -> Result<MutexGuard<'_, HashMap<Uuid, Entry>>, OcrError> {
        self.entries
            .lock()
            .map_err(|_| OcrError::Internal("session table lock poisoned".to_string()))
    }

    /// Register a new session, evicting idle ones first
    pub fn insert(&self, session: Session) -> Result<Uuid, OcrError> {
        self.evict_idle()?;

        let mut entries = self.entries()?;
        if entries.len() >= self.max_sessions {
            return Err(OcrError::TooManySessions(self.max_sessions));
        }

        let id = Uuid::new_v4();
        entries.insert(
            id,
            Entry {
                session: Arc::new(Mutex::new(session)),
                last_used: Instant::now(),
            },
        );
        tracing::info!(session_id = %id, open = entries.len(), "Session created");
        Ok(id)
    }

    /// Look up a session and mark it as used
    pub fn get(&self, id: &Uuid) -> Result<SharedSession, OcrError> {
        let mut entries = self.entries()?;
        let entry = entries
            .get_mut(id)
            .ok_or_else(|| OcrError::SessionNotFound(id.to_string()))?;
        entry.last_used = Instant::now();
        Ok(entry.session.clone())
    }

    pub fn remove(&self, id: &Uuid) -> Result<(), OcrError> {
        let removed = self.entries()?.remove(id);
        match removed {
            Some(_) => {
                tracing::info!(session_id = %id, "Session closed");
                Ok(())
            }
            None => Err(OcrError::SessionNotFound(id.to_string())),
        }
    }

    /// Drop sessions unused for longer than the TTL, returning how many went
    pub fn evict_idle(&self) -> Result<usize, OcrError> {
        let mut entries = self.entries()?;
        let before = entries.len();
        let ttl = self.ttl;
        entries.retain(|_, entry| entry.last_used.elapsed() <= ttl);

        let evicted = before - entries.len();
        if evicted > 0 {
            tracing::info!(evicted, open = entries.len(), "Evicted idle sessions");
        }
        Ok(evicted)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.lock().expect("session table lock poisoned").len()
    }
}

/// Run `action` with exclusive access to a session, failing fast if it is busy
pub fn with_session<T>(
    session: &SharedSession,
    action: impl FnOnce(&mut Session) -> Result<T, OcrError>,
) -> Result<T, OcrError> {
    let mut guard = match session.try_lock() {
        Ok(guard) => guard,
        Err(TryLockError::WouldBlock) => return Err(OcrError::SessionBusy),
        Err(TryLockError::Poisoned(_)) => {
            return Err(OcrError::Internal("session state poisoned".to_string()))
        }
    };
    action(&mut guard)
}
