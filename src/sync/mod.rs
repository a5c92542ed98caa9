//! sync
//!
//! Keeping a case current across sessions.
//!
//! # Modules
//!
//! - [`lock`] - Advisory edit lock state machine
//! - [`poll`] - Sequence-numbered refresh with stale-response discard
//! - [`viewer`] - Event loop wiring polling, compilation and locking together
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use caseview::core::case::{AssuranceCase, Node};
//! use caseview::core::schema::TypeSchema;
//! use caseview::core::types::{CaseId, SessionToken};
//! use caseview::session::SessionIdentity;
//! use caseview::store::mock::MockCaseStore;
//! use caseview::sync::{LockOutcome, Viewer, ViewerOptions};
//!
//! # tokio_test::block_on(async {
//! let store = MockCaseStore::with_cases(vec![
//!     AssuranceCase::new(CaseId::new(1), "Case").with_node("goals", Node::new(1, "G")),
//! ]);
//! let me = SessionIdentity::ephemeral("tab", SessionToken::generate());
//!
//! let viewer = Viewer::new(
//!     Arc::new(store.clone()),
//!     &me,
//!     CaseId::new(1),
//!     Arc::new(TypeSchema::assurance()),
//!     ViewerOptions::default(),
//! );
//! let (handle, task) = viewer.spawn();
//!
//! let outcome = handle.enable_edit(|_| false).await.unwrap();
//! assert_eq!(outcome, LockOutcome::Acquired);
//!
//! handle.shutdown().await.unwrap();
//! task.await.unwrap().unwrap();
//! assert!(store.lock_holder(CaseId::new(1)).is_none());
//! # });
//! ```

pub mod lock;
pub mod poll;
pub mod viewer;

pub use lock::{LockCoordinator, LockError, LockOutcome, LockState};
pub use poll::{PollingSynchronizer, Refresh, Seq};
pub use viewer::{Snapshot, Viewer, ViewerError, ViewerHandle, ViewerOptions};
