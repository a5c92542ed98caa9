//! session::file_store
//!
//! File-based session storage.
//!
//! # Storage
//!
//! - `~/.caseview/sessions.toml` - one table per context
//! - `~/.caseview/sessions.toml.lock` - OS-level exclusive lock held while
//!   reading and rewriting the file
//!
//! ```toml
//! [sessions.default]
//! token = "6c1f3a0e-5a1b-4c7e-9d5e-2b1a0c9f8e7d"
//! created_at = "2026-10-19T09:12:44Z"
//! ```
//!
//! # Invariants
//!
//! - Writes are atomic (write to temp file, then rename)
//! - File permissions are 0600 on Unix
//! - `get_or_insert` runs under the lock, so two processes resolving the same
//!   context agree on one token

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use fs2::FileExt;
use serde::{Deserialize, Serialize};

use super::{validate_context, SessionError, SessionStore, StoredSession};

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default)]
    sessions: BTreeMap<String, StoredSession>,
}

/// Session storage in a TOML file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    /// Path to the sessions file
    path: PathBuf,
}

/// Exclusive lock on the sidecar lock file, released on drop.
struct FileGuard {
    file: File,
}

impl Drop for FileGuard {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

impl FileSessionStore {
    /// Create a store at the given path.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Get the path to the sessions file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    fn lock(&self) -> Result<FileGuard, SessionError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SessionError::WriteError(format!("cannot create directory: {}", e))
            })?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.lock_path())
            .map_err(|e| SessionError::WriteError(format!("cannot open lock file: {}", e)))?;

        file.lock_exclusive()
            .map_err(|e| SessionError::WriteError(format!("cannot lock sessions: {}", e)))?;

        Ok(FileGuard { file })
    }

    fn read(&self) -> Result<SessionFile, SessionError> {
        if !self.path.exists() {
            return Ok(SessionFile::default());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| SessionError::ReadError(format!("cannot read sessions file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| SessionError::ReadError(format!("cannot parse sessions file: {}", e)))
    }

    fn write(&self, sessions: &SessionFile) -> Result<(), SessionError> {
        let content = toml::to_string_pretty(sessions)
            .map_err(|e| SessionError::WriteError(format!("cannot serialize sessions: {}", e)))?;

        let temp_path = self.path.with_extension("tmp");
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .map_err(|e| SessionError::WriteError(format!("cannot create temp file: {}", e)))?;

            #[cfg(unix)]
            {
                let permissions = fs::Permissions::from_mode(0o600);
                file.set_permissions(permissions).map_err(|e| {
                    SessionError::WriteError(format!("cannot set permissions: {}", e))
                })?;
            }

            file.write_all(content.as_bytes())
                .map_err(|e| SessionError::WriteError(format!("cannot write sessions: {}", e)))?;
            file.sync_all()
                .map_err(|e| SessionError::WriteError(format!("cannot sync to disk: {}", e)))?;
        }

        fs::rename(&temp_path, &self.path)
            .map_err(|e| SessionError::WriteError(format!("cannot rename temp file: {}", e)))
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, context: &str) -> Result<Option<StoredSession>, SessionError> {
        let _guard = self.lock()?;
        Ok(self.read()?.sessions.get(context).cloned())
    }

    fn get_or_insert(
        &self,
        context: &str,
        fresh: StoredSession,
    ) -> Result<StoredSession, SessionError> {
        validate_context(context)?;
        let _guard = self.lock()?;

        let mut file = self.read()?;
        if let Some(existing) = file.sessions.get(context) {
            return Ok(existing.clone());
        }

        file.sessions.insert(context.to_string(), fresh.clone());
        self.write(&file)?;
        Ok(fresh)
    }

    fn forget(&self, context: &str) -> Result<(), SessionError> {
        let _guard = self.lock()?;
        let mut file = self.read()?;
        if file.sessions.remove(context).is_some() {
            self.write(&file)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionIdentity;
    use tempfile::TempDir;

    fn create_test_store() -> (TempDir, FileSessionStore) {
        let temp = TempDir::new().expect("create temp dir");
        let store = FileSessionStore::with_path(temp.path().join("sessions.toml"));
        (temp, store)
    }

    #[test]
    fn get_missing_returns_none() {
        let (_temp, store) = create_test_store();
        assert!(store.get("default").expect("get").is_none());
    }

    #[test]
    fn token_survives_new_instance() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("sessions.toml");

        let first = {
            let store = FileSessionStore::with_path(path.clone());
            SessionIdentity::resolve(&store, "default").expect("resolve")
        };
        let second = {
            let store = FileSessionStore::with_path(path);
            SessionIdentity::resolve(&store, "default").expect("resolve again")
        };

        assert_eq!(first.token(), second.token());
    }

    #[test]
    fn contexts_get_distinct_tokens() {
        let (_temp, store) = create_test_store();
        let a = SessionIdentity::resolve(&store, "tab-a").expect("a");
        let b = SessionIdentity::resolve(&store, "tab-b").expect("b");
        assert_ne!(a.token(), b.token());
    }

    #[test]
    fn creates_directory_if_missing() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("subdir").join("sessions.toml");
        let store = FileSessionStore::with_path(path.clone());

        SessionIdentity::resolve(&store, "default").expect("resolve");
        assert!(path.exists());
    }

    #[test]
    fn forget_then_resolve_mints_new_token() {
        let (_temp, store) = create_test_store();
        let first = SessionIdentity::resolve(&store, "default").expect("first");
        store.forget("default").expect("forget");
        let second = SessionIdentity::resolve(&store, "default").expect("second");
        assert_ne!(first.token(), second.token());
    }

    #[test]
    fn concurrent_resolution_agrees() {
        let (_temp, store) = create_test_store();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    SessionIdentity::resolve(&store, "shared")
                        .expect("resolve")
                        .token()
                        .clone()
                })
            })
            .collect();

        let tokens: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(tokens.windows(2).all(|w| w[0] == w[1]));
    }

    #[cfg(unix)]
    #[test]
    fn permissions_0600_on_unix() {
        let (_temp, store) = create_test_store();
        SessionIdentity::resolve(&store, "default").expect("resolve");

        let mode = fs::metadata(store.path()).expect("metadata").permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn corrupt_file_is_read_error() {
        let (_temp, store) = create_test_store();
        fs::write(store.path(), "sessions = [unclosed").expect("write bad toml");

        let err = store.get("default").unwrap_err();
        assert!(err.to_string().contains("cannot parse"));
    }
}
