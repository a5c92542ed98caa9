//! session::memory
//!
//! In-memory session storage. Contents vanish with the process, which makes
//! each instance behave like a fresh browser profile.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{validate_context, SessionError, SessionStore, StoredSession};

/// Session storage backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, StoredSession>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn sessions(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, StoredSession>>, SessionError> {
        self.sessions
            .lock()
            .map_err(|_| SessionError::ReadError("session map poisoned".into()))
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, context: &str) -> Result<Option<StoredSession>, SessionError> {
        Ok(self.sessions()?.get(context).cloned())
    }

    fn get_or_insert(
        &self,
        context: &str,
        fresh: StoredSession,
    ) -> Result<StoredSession, SessionError> {
        validate_context(context)?;
        let mut sessions = self.sessions()?;
        Ok(sessions.entry(context.to_string()).or_insert(fresh).clone())
    }

    fn forget(&self, context: &str) -> Result<(), SessionError> {
        self.sessions()?.remove(context);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forget_allows_new_token() {
        let store = MemorySessionStore::new();
        let first = store.get_or_insert("tab", StoredSession::generate()).unwrap();
        store.forget("tab").unwrap();
        let second = store.get_or_insert("tab", StoredSession::generate()).unwrap();
        assert_ne!(first.token, second.token);
    }

    #[test]
    fn forget_missing_is_ok() {
        let store = MemorySessionStore::new();
        store.forget("never").unwrap();
    }
}
