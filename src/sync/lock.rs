//! sync::lock
//!
//! Advisory single-writer edit lock.
//!
//! # States
//!
//! ```text
//!                 enable (write own token)
//!   Unlocked  ------------------------------>  LockedBySelf
//!      ^                                          |
//!      |          disable (write null)            |
//!      +------------------------------------------+
//!
//!   LockedByOther --enable + confirm--> LockedBySelf   (override)
//!   LockedByOther --enable, declined--> LockedByOther  (no write)
//! ```
//!
//! Polling may move the coordinator between any two states at any time:
//! [`LockCoordinator::observe`] recomputes the state purely from the
//! document's lock holder and the local token.
//!
//! # Invariants
//!
//! - The state is only changed by `observe` or after the store acknowledges
//!   a write. A failed write leaves the state untouched.
//! - `disable` never clears another session's hold.
//! - Writes are never retried here.
//!
//! The lock is a convention between clients. The store does not enforce it,
//! so two sessions writing at once race and the last write wins; the next
//! poll shows every session who actually holds it.

use std::fmt;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::case::LOCK_FIELD;
use crate::core::types::{CaseId, SessionToken};
use crate::session::SessionIdentity;
use crate::store::{CaseStore, StoreError};

/// Errors from lock operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LockError {
    /// Writing the lock holder field failed.
    #[error("failed to write lock holder: {0}")]
    Store(#[from] StoreError),
}

/// Who may edit the case, as seen from this session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LockState {
    /// Nobody holds the lock.
    #[default]
    Unlocked,
    /// This session holds the lock.
    LockedBySelf,
    /// Another session holds the lock.
    LockedByOther(SessionToken),
}

impl LockState {
    /// Derive the state from a lock holder and the local token.
    pub fn from_holder(holder: Option<&SessionToken>, local: &SessionToken) -> Self {
        match holder {
            None => LockState::Unlocked,
            Some(h) if h == local => LockState::LockedBySelf,
            Some(h) => LockState::LockedByOther(h.clone()),
        }
    }

    /// Whether this session may edit.
    pub fn can_edit(&self) -> bool {
        matches!(self, LockState::LockedBySelf)
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockState::Unlocked => write!(f, "unlocked"),
            LockState::LockedBySelf => write!(f, "locked by this session"),
            LockState::LockedByOther(holder) => write!(f, "locked by {}", holder),
        }
    }
}

/// Result of an enable request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome {
    /// The case was unlocked and is now held by this session.
    Acquired,
    /// Another session's hold was replaced after confirmation.
    Overridden,
    /// The user declined to override; nothing was written.
    Declined,
    /// This session already held the lock; nothing was written.
    AlreadyHeld,
}

impl LockOutcome {
    /// Whether a write reached the store.
    pub fn wrote(self) -> bool {
        matches!(self, LockOutcome::Acquired | LockOutcome::Overridden)
    }
}

/// Edit-lock state machine for one case and one session.
#[derive(Debug, Clone)]
pub struct LockCoordinator {
    case: CaseId,
    local: SessionToken,
    state: LockState,
}

impl LockCoordinator {
    /// Create a coordinator in the `Unlocked` state.
    pub fn new(case: CaseId, identity: &SessionIdentity) -> Self {
        Self {
            case,
            local: identity.token().clone(),
            state: LockState::Unlocked,
        }
    }

    /// The case this coordinator guards.
    pub fn case(&self) -> CaseId {
        self.case
    }

    /// Current state.
    pub fn state(&self) -> &LockState {
        &self.state
    }

    /// Recompute the state from the document's lock holder.
    ///
    /// Returns `true` if the state changed.
    pub fn observe(&mut self, holder: Option<&SessionToken>) -> bool {
        let next = LockState::from_holder(holder, &self.local);
        if next == self.state {
            return false;
        }
        debug!(case = %self.case, from = %self.state, to = %next, "lock state changed");
        self.state = next;
        true
    }

    /// Request edit mode.
    ///
    /// When another session holds the lock, `confirm` is asked with the
    /// holder's token; only a `true` answer overwrites it.
    ///
    /// # Errors
    ///
    /// - `LockError::Store` if the write fails; the state is unchanged
    pub async fn enable<F>(
        &mut self,
        store: &dyn CaseStore,
        confirm: F,
    ) -> Result<LockOutcome, LockError>
    where
        F: FnOnce(&SessionToken) -> bool,
    {
        let outcome = match &self.state {
            LockState::LockedBySelf => return Ok(LockOutcome::AlreadyHeld),
            LockState::Unlocked => LockOutcome::Acquired,
            LockState::LockedByOther(holder) => {
                if !confirm(holder) {
                    debug!(case = %self.case, holder = %holder, "override declined");
                    return Ok(LockOutcome::Declined);
                }
                LockOutcome::Overridden
            }
        };

        self.write(store, Value::String(self.local.as_str().to_string()))
            .await?;
        info!(case = %self.case, ?outcome, "edit lock taken");
        self.state = LockState::LockedBySelf;
        Ok(outcome)
    }

    /// Leave edit mode.
    ///
    /// Returns `true` if the lock was released. Does nothing unless this
    /// session holds the lock.
    ///
    /// # Errors
    ///
    /// - `LockError::Store` if the write fails; the state is unchanged
    pub async fn disable(&mut self, store: &dyn CaseStore) -> Result<bool, LockError> {
        if !self.state.can_edit() {
            return Ok(false);
        }

        self.write(store, Value::Null).await?;
        info!(case = %self.case, "edit lock released");
        self.state = LockState::Unlocked;
        Ok(true)
    }

    /// Best-effort release when the viewer goes away.
    ///
    /// Failures are logged and swallowed. Returns `true` only if a release
    /// was written and acknowledged.
    pub async fn release_on_teardown(&mut self, store: &dyn CaseStore) -> bool {
        match self.disable(store).await {
            Ok(released) => released,
            Err(e) => {
                warn!(case = %self.case, error = %e, "could not release edit lock");
                false
            }
        }
    }

    async fn write(&self, store: &dyn CaseStore, value: Value) -> Result<(), LockError> {
        store
            .patch_case_field(self.case, LOCK_FIELD, value)
            .await
            .map_err(LockError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::case::AssuranceCase;
    use crate::store::mock::{FailOn, MockCaseStore};

    fn token(s: &str) -> SessionToken {
        SessionToken::new(s).unwrap()
    }

    fn setup() -> (MockCaseStore, LockCoordinator) {
        let store = MockCaseStore::with_cases(vec![AssuranceCase::new(CaseId::new(1), "Case")]);
        let identity = SessionIdentity::ephemeral("tab", token("s1"));
        (store, LockCoordinator::new(CaseId::new(1), &identity))
    }

    #[test]
    fn state_from_holder() {
        let local = token("s1");
        assert_eq!(LockState::from_holder(None, &local), LockState::Unlocked);
        assert_eq!(
            LockState::from_holder(Some(&token("s1")), &local),
            LockState::LockedBySelf
        );
        assert_eq!(
            LockState::from_holder(Some(&token("s2")), &local),
            LockState::LockedByOther(token("s2"))
        );
    }

    #[test]
    fn observe_reports_change_once() {
        let (_, mut lock) = setup();
        assert!(!lock.observe(None));
        assert!(lock.observe(Some(&token("s2"))));
        assert!(!lock.observe(Some(&token("s2"))));
        assert!(lock.observe(Some(&token("s3"))));
    }

    #[tokio::test]
    async fn enable_when_unlocked_writes_token() {
        let (store, mut lock) = setup();
        let outcome = lock
            .enable(&store, |_| panic!("no prompt when unlocked"))
            .await
            .unwrap();
        assert_eq!(outcome, LockOutcome::Acquired);
        assert_eq!(lock.state(), &LockState::LockedBySelf);
        assert_eq!(store.lock_holder(CaseId::new(1)), Some(token("s1")));
    }

    #[tokio::test]
    async fn enable_when_held_is_noop() {
        let (store, mut lock) = setup();
        lock.observe(Some(&token("s1")));
        let outcome = lock.enable(&store, |_| true).await.unwrap();
        assert_eq!(outcome, LockOutcome::AlreadyHeld);
        assert_eq!(store.patch_count(), 0);
    }

    #[tokio::test]
    async fn declined_override_writes_nothing() {
        let (store, mut lock) = setup();
        store.set_lock_holder(CaseId::new(1), Some(token("s2")));
        lock.observe(Some(&token("s2")));

        let mut asked = None;
        let outcome = lock
            .enable(&store, |holder| {
                asked = Some(holder.clone());
                false
            })
            .await
            .unwrap();

        assert_eq!(outcome, LockOutcome::Declined);
        assert_eq!(asked, Some(token("s2")));
        assert_eq!(lock.state(), &LockState::LockedByOther(token("s2")));
        assert_eq!(store.patch_count(), 0);
    }

    #[tokio::test]
    async fn confirmed_override_takes_lock() {
        let (store, mut lock) = setup();
        store.set_lock_holder(CaseId::new(1), Some(token("s2")));
        lock.observe(Some(&token("s2")));

        let outcome = lock.enable(&store, |_| true).await.unwrap();
        assert_eq!(outcome, LockOutcome::Overridden);
        assert_eq!(store.lock_holder(CaseId::new(1)), Some(token("s1")));
    }

    #[tokio::test]
    async fn disable_only_clears_own_hold() {
        let (store, mut lock) = setup();
        store.set_lock_holder(CaseId::new(1), Some(token("s2")));
        lock.observe(Some(&token("s2")));

        assert!(!lock.disable(&store).await.unwrap());
        assert_eq!(store.lock_holder(CaseId::new(1)), Some(token("s2")));
        assert_eq!(store.patch_count(), 0);
    }

    #[tokio::test]
    async fn failed_write_keeps_state() {
        let (store, mut lock) = setup();
        store.set_fail_on(FailOn::PatchCaseField(StoreError::NetworkError(
            "unreachable".into(),
        )));

        let err = lock.enable(&store, |_| true).await.unwrap_err();
        assert!(matches!(err, LockError::Store(StoreError::NetworkError(_))));
        assert_eq!(lock.state(), &LockState::Unlocked);
    }

    #[tokio::test]
    async fn teardown_release_swallows_failure() {
        let (store, mut lock) = setup();
        lock.enable(&store, |_| true).await.unwrap();
        store.set_fail_on(FailOn::PatchCaseField(StoreError::NetworkError(
            "gone".into(),
        )));

        assert!(!lock.release_on_teardown(&store).await);
        assert_eq!(lock.state(), &LockState::LockedBySelf);
    }

    #[tokio::test]
    async fn teardown_release_noop_when_not_holding() {
        let (store, mut lock) = setup();
        assert!(!lock.release_on_teardown(&store).await);
        assert_eq!(store.patch_count(), 0);
    }
}
