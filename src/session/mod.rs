//! session
//!
//! Per-context session identity.
//!
//! # Design
//!
//! A session token identifies one browsing context (a terminal profile, a
//! tab, a test case), not a user: two contexts belonging to the same person
//! look like two different editors. The first resolution in a context mints a
//! random token and persists it; every later resolution in that context
//! returns the same token. Tokens never move between contexts and never
//! expire here.
//!
//! The resolved [`SessionIdentity`] is an ordinary value. It is built once
//! and passed by reference to the lock coordinator and the viewer; nothing
//! reads it from global state.
//!
//! # Modules
//!
//! - [`file_store`] - TOML file storage, shared safely between processes
//! - [`memory`] - In-memory storage for tests
//!
//! # Example
//!
//! ```
//! use caseview::session::{MemorySessionStore, SessionIdentity};
//!
//! let store = MemorySessionStore::new();
//! let first = SessionIdentity::resolve(&store, "tab-1").unwrap();
//! let again = SessionIdentity::resolve(&store, "tab-1").unwrap();
//! let other = SessionIdentity::resolve(&store, "tab-2").unwrap();
//!
//! assert_eq!(first.token(), again.token());
//! assert_ne!(first.token(), other.token());
//! ```

pub mod file_store;
pub mod memory;

pub use file_store::FileSessionStore;
pub use memory::MemorySessionStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::core::types::SessionToken;

/// Errors from session storage.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Context names must be non-empty.
    #[error("invalid session context: {0}")]
    InvalidContext(String),

    /// Failed to read session storage.
    #[error("failed to read sessions: {0}")]
    ReadError(String),

    /// Failed to write session storage.
    #[error("failed to write sessions: {0}")]
    WriteError(String),
}

/// A persisted session entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    /// The context's token
    pub token: SessionToken,
    /// When the token was minted
    pub created_at: DateTime<Utc>,
}

impl StoredSession {
    /// Mint a fresh session entry.
    pub fn generate() -> Self {
        Self {
            token: SessionToken::generate(),
            created_at: Utc::now(),
        }
    }
}

/// Context-scoped persisted storage for session tokens.
///
/// Implementations must make [`get_or_insert`](Self::get_or_insert) atomic
/// with respect to other users of the same storage, so one context never
/// ends up with two tokens.
pub trait SessionStore: Send + Sync {
    /// Get the entry for a context, if any.
    fn get(&self, context: &str) -> Result<Option<StoredSession>, SessionError>;

    /// Return the existing entry for a context, or store `fresh` and return
    /// it if there is none.
    fn get_or_insert(
        &self,
        context: &str,
        fresh: StoredSession,
    ) -> Result<StoredSession, SessionError>;

    /// Remove the entry for a context. Missing entries are not an error.
    fn forget(&self, context: &str) -> Result<(), SessionError>;
}

/// The identity of the current browsing context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    context: String,
    session: StoredSession,
}

impl SessionIdentity {
    /// Resolve the identity for `context`, minting and persisting a token on
    /// first use.
    ///
    /// # Errors
    ///
    /// - `SessionError::InvalidContext` for an empty context name
    /// - storage read/write errors
    pub fn resolve(store: &dyn SessionStore, context: &str) -> Result<Self, SessionError> {
        validate_context(context)?;
        let session = store.get_or_insert(context, StoredSession::generate())?;
        debug!(context, token = %session.token, "resolved session identity");
        Ok(Self {
            context: context.to_string(),
            session,
        })
    }

    /// Build an identity from a known token without touching storage.
    pub fn ephemeral(context: impl Into<String>, token: SessionToken) -> Self {
        Self {
            context: context.into(),
            session: StoredSession {
                token,
                created_at: Utc::now(),
            },
        }
    }

    /// The context name.
    pub fn context(&self) -> &str {
        &self.context
    }

    /// The session token.
    pub fn token(&self) -> &SessionToken {
        &self.session.token
    }

    /// When the token was minted.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.session.created_at
    }

    /// Whether `holder` is this session.
    pub fn is(&self, holder: &SessionToken) -> bool {
        &self.session.token == holder
    }
}

pub(crate) fn validate_context(context: &str) -> Result<(), SessionError> {
    if context.trim().is_empty() {
        return Err(SessionError::InvalidContext(
            "context name cannot be empty".into(),
        ));
    }
    Ok(())
}
